use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thermowatch_broadcast::BroadcastHub;
use thermowatch_history::HistoryStore;
use thermowatch_protocol::Fault;
use thermowatch_sensor::{SensorError, SensorSource};
use thermowatch_sink::SinkForwarder;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::PollError;
use crate::status::{PollMonitor, PollState};

/// Shortest accepted tick period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Fixed-interval sensor poll loop.
///
/// Owns the sensor source from construction until [`stop`](Self::stop),
/// which waits for any in-flight tick and then closes the source.
pub struct PollLoop {
    ctx: Arc<TickContext>,
    interval: Duration,
    task: Mutex<Task>,
}

enum Task {
    Ready(Box<dyn SensorSource>),
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
    Stopped,
}

struct TickContext {
    store: Arc<HistoryStore>,
    hub: Arc<BroadcastHub>,
    forwarder: Option<SinkForwarder>,
    monitor: PollMonitor,
}

impl PollLoop {
    /// Creates a loop feeding `hub` (and the store behind it).
    ///
    /// `interval` is clamped to at least 1 ms.
    pub fn new(
        source: impl SensorSource,
        hub: Arc<BroadcastHub>,
        forwarder: Option<SinkForwarder>,
        interval: Duration,
    ) -> Self {
        Self {
            ctx: Arc::new(TickContext {
                store: Arc::clone(hub.store()),
                hub,
                forwarder,
                monitor: PollMonitor::new(),
            }),
            interval: interval.max(MIN_INTERVAL),
            task: Mutex::new(Task::Ready(Box::new(source))),
        }
    }

    /// Spawns the tick task. The first tick fires one interval from now.
    pub async fn start(&self) -> Result<(), PollError> {
        let mut task = self.task.lock().await;

        let source = match std::mem::replace(&mut *task, Task::Stopped) {
            Task::Ready(source) => source,
            running @ Task::Running { .. } => {
                *task = running;
                return Err(PollError::AlreadyRunning);
            }
            Task::Stopped => return Err(PollError::Stopped),
        };

        let name = source.name().to_string();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            source,
            Arc::clone(&self.ctx),
            self.interval,
            cancel.clone(),
        ));
        *task = Task::Running { cancel, handle };

        tracing::info!(
            source = %name,
            interval_ms = self.interval.as_millis() as u64,
            "poll loop started"
        );
        Ok(())
    }

    /// Stops ticking, lets an in-flight tick finish, then closes the source.
    ///
    /// Returns once the source has been released. Calling it again is a no-op.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;

        match std::mem::replace(&mut *task, Task::Stopped) {
            Task::Running { cancel, handle } => {
                cancel.cancel();
                if let Err(e) = handle.await {
                    tracing::error!("poll task ended abnormally: {e}");
                }
                tracing::info!("poll loop stopped");
            }
            Task::Ready(mut source) => source.close().await,
            Task::Stopped => {}
        }

        self.ctx.monitor.set_state(PollState::Stopped);
    }

    /// Returns `true` while the tick task is running.
    pub async fn is_running(&self) -> bool {
        matches!(*self.task.lock().await, Task::Running { .. })
    }

    /// Read-only view of state and counters.
    pub fn monitor(&self) -> PollMonitor {
        self.ctx.monitor.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        if let Task::Running { cancel, .. } = self.task.get_mut() {
            cancel.cancel();
        }
    }
}

/// Main tick loop. Cancellation is only observed between ticks.
async fn poll_loop(
    mut source: Box<dyn SensorSource>,
    ctx: Arc<TickContext>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Skip the first immediate tick.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => ctx.tick(source.as_mut()).await,
        }
    }

    source.close().await;
    ctx.monitor.set_state(PollState::Stopped);
}

impl TickContext {
    async fn tick(&self, source: &mut dyn SensorSource) {
        self.monitor.set_state(PollState::Polling);
        self.monitor.record(|s| s.ticks += 1);

        let result = AssertUnwindSafe(source.poll())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(SensorError::Transport(std::io::Error::other(format!(
                    "sensor poll panicked: {}",
                    panic_message(&*panic)
                ))))
            });

        match result {
            Ok(reading) => {
                let seq = self.store.append(reading);
                let subscribers = self.hub.publish(seq, reading);
                if let Some(forwarder) = &self.forwarder {
                    forwarder.forward(reading);
                }

                self.monitor.record(|s| s.accepted += 1);
                self.monitor.set_state(PollState::Accepted);
                tracing::info!(seq, subscribers, "temperature: {:.2} °C", reading.value);
            }
            Err(SensorError::Fault(reason)) => {
                tracing::warn!(source = source.name(), "sensor fault: {reason}");
                let fault = Fault::new(reason);
                self.hub.publish_fault(&fault);

                self.monitor.record(|s| s.faults += 1);
                self.monitor.set_state(PollState::Faulted);
            }
            Err(e) => {
                tracing::error!(source = source.name(), error = ?e, "sensor read failed: {e}");

                self.monitor.record(|s| s.transport_errors += 1);
                self.monitor.set_state(PollState::Faulted);
            }
        }

        self.monitor.set_state(PollState::Idle);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
