use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::Response;
use axum::routing::get;
use chrono::{SubsecRound, Utc};
use serde::Serialize;
use thermowatch_broadcast::BroadcastHub;
use thermowatch_poller::PollMonitor;
use thermowatch_protocol::constants::{PATH_CURRENT, PATH_HEALTH, PATH_HISTORY, PATH_WS};
use thermowatch_protocol::{CurrentTemperature, Reading};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    hub: Arc<BroadcastHub>,
    poll: Option<PollMonitor>,
    cancel: CancellationToken,
}

impl AppState {
    /// `poll` is `None` when the sensor could not be opened and the server
    /// runs without a poll loop.
    pub fn new(hub: Arc<BroadcastHub>, poll: Option<PollMonitor>, cancel: CancellationToken) -> Self {
        Self { hub, poll, cancel }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sensor: &'static str,
    pub subscribers: usize,
    pub history_length: usize,
    pub ticks: u64,
    pub accepted: u64,
    pub faults: u64,
    pub transport_errors: u64,
}

/// Builds the monitor's router.
///
/// When `static_dir` is set, unmatched paths are served from it.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route(PATH_WS, get(live_socket))
        .route(PATH_CURRENT, get(current))
        .route(PATH_HISTORY, get(history))
        .route(PATH_HEALTH, get(health));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn current(State(state): State<AppState>) -> Json<CurrentTemperature> {
    let now = Utc::now().trunc_subsecs(3);
    Json(CurrentTemperature::from_current(state.hub.store().current(), now))
}

async fn history(State(state): State<AppState>) -> Json<Vec<Reading>> {
    Json(state.hub.store().snapshot())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.poll.as_ref().map(|p| p.stats()).unwrap_or_default();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sensor: if state.poll.is_some() { "online" } else { "offline" },
        subscribers: state.hub.subscriber_count(),
        history_length: state.hub.store().len(),
        ticks: stats.ticks,
        accepted: stats.accepted,
        faults: stats.faults,
        transport_errors: stats.transport_errors,
    })
}

async fn live_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| crate::connection::serve_socket(socket, state.hub, state.cancel))
}
