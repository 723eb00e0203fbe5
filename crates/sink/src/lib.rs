//! Outbound telemetry forwarding.
//!
//! Readings are pushed to a [`TelemetrySink`] through a [`SinkForwarder`],
//! which never blocks the caller: each delivery runs as its own task with a
//! timeout, failures are logged and dropped, nothing is retried.

mod forwarder;
mod http;

use std::future::Future;
use std::pin::Pin;

use thermowatch_protocol::Reading;

pub use forwarder::{ForwarderStats, SinkForwarder};
pub use http::{HttpSink, parse_endpoint};

/// A boxed future returned by [`TelemetrySink::send`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;

/// Errors from a sink delivery.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("{0}")]
    Other(String),
}

/// External system accepting readings.
pub trait TelemetrySink: Send + Sync + 'static {
    fn send(&self, reading: Reading) -> SinkFuture<'_>;
}
