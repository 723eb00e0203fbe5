//! Thermowatch monitor entry point.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting thermowatch monitor"
    );

    let config = config::Config::load()?;
    tracing::info!(
        port = config.port,
        poll_interval_ms = config.poll_interval_ms,
        history_capacity = config.history_capacity,
        sensor = config.sensor.kind(),
        sink = config.sink.is_some(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("monitor shut down cleanly");
    Ok(())
}
