//! HTTP server for the temperature monitor.
//!
//! Serves the pull queries (`/api/temperature`, `/api/temperature/history`,
//! `/health`), the WebSocket live channel (`/ws`) and, optionally, a static
//! dashboard directory. Every live viewer is one subscriber of the
//! [`BroadcastHub`](thermowatch_broadcast::BroadcastHub).

mod connection;
mod routes;
mod server;

pub use routes::{AppState, HealthResponse, router};
pub use server::{MonitorServer, ServerConfig};

/// Errors produced by the monitor server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server already running")]
    AlreadyRunning,
}
