use std::time::Duration;

/// Default time between two sensor polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default number of readings kept in the history window.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default HTTP port of the monitor.
pub const DEFAULT_PORT: u16 = 3000;

/// How often the server pings a live viewer.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(30);

/// Time to wait for a pong (or any inbound frame) before dropping a viewer.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// Per-subscriber event buffer.
///
/// A subscriber whose buffer is full is considered broken and removed, so
/// this must comfortably hold the history frame plus a burst of live events.
pub const SUBSCRIBER_BUFFER_SIZE: usize = 256;

/// Default upper bound for a single sink delivery.
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of sink deliveries allowed in flight at once.
pub const DEFAULT_SINK_MAX_IN_FLIGHT: usize = 8;

/// Fault reason reported when the thermocouple input is open.
pub const THERMOCOUPLE_OPEN: &str = "Thermocouple not connected!";

/// Live channel route.
pub const PATH_WS: &str = "/ws";

/// Current temperature query route.
pub const PATH_CURRENT: &str = "/api/temperature";

/// History query route.
pub const PATH_HISTORY: &str = "/api/temperature/history";

/// Health route.
pub const PATH_HEALTH: &str = "/health";
