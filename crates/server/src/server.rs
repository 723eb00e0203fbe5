//! Monitor HTTP server.
//!
//! Listens on a TCP port and serves the query routes, the live WebSocket
//! channel and the optional static directory until cancelled.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thermowatch_broadcast::BroadcastHub;
use thermowatch_poller::PollMonitor;
use thermowatch_protocol::constants::DEFAULT_PORT;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::routes::{AppState, router};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory served for paths no route matches.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: None,
        }
    }
}

/// The monitor server.
pub struct MonitorServer {
    config: ServerConfig,
    hub: Arc<BroadcastHub>,
    poll: Option<PollMonitor>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    running: AtomicBool,
}

impl MonitorServer {
    pub fn new(config: ServerConfig, hub: Arc<BroadcastHub>, poll: Option<PollMonitor>) -> Arc<Self> {
        Arc::new(Self {
            config,
            hub,
            poll,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Stops accepting requests and closes every live viewer.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until [`shutdown`](Self::shutdown) is called.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("monitor server listening on {local_addr}");
        if let Some(dir) = &self.config.static_dir {
            tracing::info!(dir = %dir.display(), "serving static files");
        }

        let state = AppState::new(Arc::clone(&self.hub), self.poll.clone(), self.cancel.clone());
        let app = router(state, self.config.static_dir.as_deref());

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await?;

        tracing::info!("server shut down");
        Ok(())
    }
}
