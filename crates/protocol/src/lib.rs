pub mod constants;
pub mod envelope;
pub mod telemetry;
pub mod types;

// Re-export primary types for convenience.
pub use envelope::LiveMessage;
pub use telemetry::{CurrentTemperature, FaultEvent};
pub use types::{Fault, Reading};
