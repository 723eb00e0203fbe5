//! Sensor poll loop.
//!
//! Ticks on a fixed interval, pulls one sample from a
//! [`SensorSource`](thermowatch_sensor::SensorSource), appends accepted
//! readings to the history store, fans them out to live subscribers and hands
//! them to the sink forwarder. A failed tick never stops the loop.

mod poll_loop;
mod status;

pub use poll_loop::PollLoop;
pub use status::{PollMonitor, PollState, PollStats};

/// Errors from controlling a [`PollLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("poll loop already running")]
    AlreadyRunning,

    #[error("poll loop stopped")]
    Stopped,
}
