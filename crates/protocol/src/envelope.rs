use serde::{Deserialize, Serialize};

use crate::telemetry::FaultEvent;
use crate::types::Reading;

/// Envelope for every live channel frame.
///
/// Serialized as `{"type": "...", "payload": ...}`. A viewer always receives
/// exactly one `temperatureHistory` frame first, then `temperature` and
/// `error` frames as they occur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum LiveMessage {
    #[serde(rename = "temperatureHistory")]
    TemperatureHistory(Vec<Reading>),
    #[serde(rename = "temperature")]
    Temperature(Reading),
    #[serde(rename = "error")]
    Error(FaultEvent),
}

impl LiveMessage {
    /// Serializes the message into a text frame body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns the wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TemperatureHistory(_) => "temperatureHistory",
            Self::Temperature(_) => "temperature",
            Self::Error(_) => "error",
        }
    }
}
