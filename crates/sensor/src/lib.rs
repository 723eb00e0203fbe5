//! Sensor sources for the temperature monitor.
//!
//! The poll loop only sees the [`SensorSource`] trait: one `poll` per tick
//! that yields a [`Reading`] or a [`SensorError`], and a `close` hook that
//! releases the underlying device on shutdown.

pub mod max6675;
mod simulated;
mod spidev;

use std::future::Future;
use std::pin::Pin;

use thermowatch_protocol::Reading;

pub use simulated::SimulatedSource;
pub use spidev::SpidevSource;

/// A boxed future returned by sensor source methods.
pub type SensorFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors produced while sampling a sensor.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The sensor reported a domain fault (e.g. open thermocouple).
    #[error("sensor fault: {0}")]
    Fault(String),

    /// The device could not be read at all.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The device answered with a frame that cannot be a valid sample.
    #[error("invalid frame: {0:#06x}")]
    InvalidFrame(u16),

    #[error("sensor closed")]
    Closed,
}

impl SensorError {
    #[cfg(test)]
    pub(crate) fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

/// A single scalar sensor polled once per tick.
pub trait SensorSource: Send + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Takes one sample.
    fn poll(&mut self) -> SensorFuture<'_, Result<Reading, SensorError>>;

    /// Releases the underlying device. Called once, after the last poll.
    fn close(&mut self) -> SensorFuture<'_, ()> {
        Box::pin(async {})
    }
}

impl SensorSource for Box<dyn SensorSource> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn poll(&mut self) -> SensorFuture<'_, Result<Reading, SensorError>> {
        (**self).poll()
    }

    fn close(&mut self) -> SensorFuture<'_, ()> {
        (**self).close()
    }
}
