//! Application orchestrator: wires the monitor components together.

use std::future::Future;
use std::sync::Arc;

use thermowatch_broadcast::BroadcastHub;
use thermowatch_history::HistoryStore;
use thermowatch_poller::PollLoop;
use thermowatch_sensor::{SensorError, SensorSource, SimulatedSource, SpidevSource};
use thermowatch_server::{MonitorServer, ServerConfig};
use thermowatch_sink::{HttpSink, SinkForwarder};

use crate::config::{Config, SensorConfig, SinkConfig};

/// Runs the monitor until SIGINT or SIGTERM.
pub async fn run(config: Config) -> anyhow::Result<()> {
    run_until(config, shutdown_signal()).await
}

/// Runs the monitor until `shutdown` resolves or the server fails.
pub async fn run_until(config: Config, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    // -- State --
    let store = Arc::new(HistoryStore::new(config.history_capacity));
    let hub = Arc::new(BroadcastHub::new(store));

    // -- Sink --
    let forwarder = config.sink.as_ref().map(build_forwarder).transpose()?;

    // -- Poll loop --
    let poller = match open_sensor(&config.sensor).await {
        Ok(source) => {
            tracing::info!(source = source.name(), "sensor opened");
            let poller = PollLoop::new(source, Arc::clone(&hub), forwarder, config.poll_interval());
            poller.start().await?;
            Some(poller)
        }
        Err(e) => {
            tracing::error!(
                sensor = config.sensor.kind(),
                "failed to open sensor, serving without live readings: {e}"
            );
            None
        }
    };

    // -- HTTP server --
    let server_config = ServerConfig {
        port: config.port,
        static_dir: config.static_dir.clone(),
    };
    let server = MonitorServer::new(server_config, hub, poller.as_ref().map(PollLoop::monitor));
    let server_run = Arc::clone(&server);
    let mut server_task = tokio::spawn(async move { server_run.run().await });

    tracing::info!("monitor ready");

    // -- Main loop: wait for shutdown --
    let early_exit = tokio::select! {
        _ = shutdown => None,
        result = &mut server_task => Some(result),
    };

    // -- Graceful shutdown --
    tracing::info!("stopping services...");
    if let Some(poller) = &poller {
        poller.stop().await;
    }

    match early_exit {
        Some(result) => result??,
        None => {
            server.shutdown();
            server_task.await??;
        }
    }

    Ok(())
}

async fn open_sensor(config: &SensorConfig) -> Result<Box<dyn SensorSource>, SensorError> {
    match config {
        SensorConfig::Spidev { device } => Ok(Box::new(SpidevSource::open(device).await?)),
        SensorConfig::Simulated => Ok(Box::new(SimulatedSource::default())),
    }
}

fn build_forwarder(config: &SinkConfig) -> anyhow::Result<SinkForwarder> {
    let sink = HttpSink::new(&config.endpoint, &config.headers)?;
    tracing::info!(endpoint = sink.endpoint(), "forwarding readings to sink");
    Ok(SinkForwarder::new(sink, config.timeout()))
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    fn test_config(sensor: SensorConfig) -> Config {
        Config {
            port: 0,
            poll_interval_ms: 5,
            sensor,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn runs_with_simulated_sensor_until_shutdown() {
        let config = test_config(SensorConfig::Simulated);
        let shutdown = tokio::time::sleep(Duration::from_millis(100));

        run_until(config, shutdown).await.unwrap();
    }

    #[tokio::test]
    async fn missing_sensor_device_keeps_server_running() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(SensorConfig::Spidev {
            device: tmp.path().join("spidev9.9"),
        });
        let shutdown = tokio::time::sleep(Duration::from_millis(50));

        run_until(config, shutdown).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_sink_is_a_startup_error() {
        let mut config = test_config(SensorConfig::Simulated);
        config.sink = Some(SinkConfig {
            endpoint: "http://localhost/x".into(),
            timeout_ms: 100,
            headers: BTreeMap::from([("bad header".into(), "v".into())]),
        });

        let result = run_until(config, std::future::pending()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn open_sensor_picks_configured_source() {
        let simulated = open_sensor(&SensorConfig::Simulated).await.unwrap();
        assert_eq!(simulated.name(), "simulated");

        let missing = open_sensor(&SensorConfig::Spidev {
            device: PathBuf::from("/nonexistent/spidev0.0"),
        })
        .await;
        assert!(matches!(missing, Err(SensorError::Transport(_))));
    }
}
