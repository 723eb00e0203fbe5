use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use thermowatch_protocol::Reading;
use thermowatch_protocol::constants::DEFAULT_SINK_MAX_IN_FLIGHT;
use tokio::sync::Semaphore;

use crate::TelemetrySink;

/// Delivery counters, updated as deliveries finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwarderStats {
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Readings dropped because too many deliveries were still pending.
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    dropped: AtomicU64,
}

/// Fire-and-forget forwarding of readings to a [`TelemetrySink`].
///
/// Cloneable; clones share the sink, the in-flight limit and the counters.
#[derive(Clone)]
pub struct SinkForwarder {
    sink: Arc<dyn TelemetrySink>,
    timeout: Duration,
    permits: Arc<Semaphore>,
    counters: Arc<Counters>,
}

impl SinkForwarder {
    pub fn new(sink: impl TelemetrySink, timeout: Duration) -> Self {
        Self::from_arc(Arc::new(sink), timeout)
    }

    pub fn from_arc(sink: Arc<dyn TelemetrySink>, timeout: Duration) -> Self {
        Self {
            sink,
            timeout,
            permits: Arc::new(Semaphore::new(DEFAULT_SINK_MAX_IN_FLIGHT)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Caps the number of pending deliveries (minimum 1).
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// Starts delivering `reading` and returns immediately.
    ///
    /// Must be called from within a tokio runtime. The outcome is only
    /// logged; the caller never learns whether the sink accepted it.
    pub fn forward(&self, reading: Reading) {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(temperature = reading.value, "sink busy, dropping reading");
            return;
        };

        let sink = Arc::clone(&self.sink);
        let counters = Arc::clone(&self.counters);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let _permit = permit;
            match tokio::time::timeout(timeout, sink.send(reading)).await {
                Ok(Ok(())) => {
                    counters.delivered.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(temperature = reading.value, "reading forwarded");
                }
                Ok(Err(e)) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(temperature = reading.value, "sink delivery failed: {e}");
                }
                Err(_) => {
                    counters.timed_out.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        temperature = reading.value,
                        timeout_ms = timeout.as_millis() as u64,
                        "sink delivery timed out"
                    );
                }
            }
        });
    }

    pub fn stats(&self) -> ForwarderStats {
        ForwarderStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            timed_out: self.counters.timed_out.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for SinkForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkForwarder")
            .field("timeout", &self.timeout)
            .field("available", &self.permits.available_permits())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{SinkError, SinkFuture};

    /// Records readings; optionally fails or hangs.
    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<f64>>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl TelemetrySink for Arc<RecordingSink> {
        fn send(&self, reading: Reading) -> SinkFuture<'_> {
            Box::pin(async move {
                if let Some(d) = self.delay {
                    tokio::time::sleep(d).await;
                }
                self.seen.lock().unwrap().push(reading.value);
                if self.fail {
                    Err(SinkError::Other("rejected".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_without_blocking() {
        let sink = Arc::new(RecordingSink::default());
        let fwd = SinkForwarder::new(Arc::clone(&sink), Duration::from_secs(1));

        fwd.forward(Reading::now(1.0));
        fwd.forward(Reading::now(2.0));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut seen = sink.seen.lock().unwrap().clone();
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, vec![1.0, 2.0]);
        assert_eq!(fwd.stats().delivered, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let fwd = SinkForwarder::new(Arc::clone(&sink), Duration::from_secs(1));

        fwd.forward(Reading::now(3.0));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(sink.seen.lock().unwrap().len(), 1);
        assert_eq!(
            fwd.stats(),
            ForwarderStats {
                failed: 1,
                ..ForwarderStats::default()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_sink_times_out() {
        let sink = Arc::new(RecordingSink {
            delay: Some(Duration::from_secs(30)),
            ..RecordingSink::default()
        });
        let fwd = SinkForwarder::new(Arc::clone(&sink), Duration::from_secs(2));

        fwd.forward(Reading::now(4.0));
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(fwd.stats().timed_out, 1);
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drops_when_too_many_in_flight() {
        let sink = Arc::new(RecordingSink {
            delay: Some(Duration::from_secs(1)),
            ..RecordingSink::default()
        });
        let fwd = SinkForwarder::new(Arc::clone(&sink), Duration::from_secs(5)).with_max_in_flight(2);

        for v in 0..5 {
            fwd.forward(Reading::now(v as f64));
        }
        assert_eq!(fwd.stats().dropped, 3);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fwd.stats().delivered, 2);

        // Permits are released once deliveries finish.
        fwd.forward(Reading::now(9.0));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fwd.stats().delivered, 3);
    }
}
