use std::sync::Arc;

use parking_lot::Mutex;

/// Poll loop state.
///
/// `Idle → Polling → {Accepted, Faulted} → Idle`, and `Stopped` once the loop
/// has shut down and released its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Accepted,
    Faulted,
    Stopped,
}

impl PollState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Accepted => "accepted",
            Self::Faulted => "faulted",
            Self::Stopped => "stopped",
        }
    }
}

/// Per-tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ticks: u64,
    pub accepted: u64,
    pub faults: u64,
    pub transport_errors: u64,
}

#[derive(Debug)]
pub(crate) struct Status {
    pub(crate) state: PollState,
    pub(crate) stats: PollStats,
}

/// Read-only view of a poll loop, cheap to clone.
#[derive(Debug, Clone)]
pub struct PollMonitor {
    pub(crate) status: Arc<Mutex<Status>>,
}

impl PollMonitor {
    pub(crate) fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(Status {
                state: PollState::Idle,
                stats: PollStats::default(),
            })),
        }
    }

    pub fn state(&self) -> PollState {
        self.status.lock().state
    }

    pub fn stats(&self) -> PollStats {
        self.status.lock().stats
    }

    pub(crate) fn set_state(&self, state: PollState) {
        let mut status = self.status.lock();
        if status.state != PollState::Stopped {
            tracing::trace!(from = status.state.as_str(), to = state.as_str(), "poll state");
            status.state = state;
        }
    }

    pub(crate) fn record(&self, f: impl FnOnce(&mut PollStats)) {
        f(&mut self.status.lock().stats);
    }
}
