use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Fault, Reading, iso_millis};

/// Response body of the current temperature query.
///
/// `temperature` is `null` until the first reading has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTemperature {
    pub temperature: Option<f64>,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl CurrentTemperature {
    /// Builds the response from the newest reading, falling back to `now`
    /// for the timestamp when there is none.
    pub fn from_current(current: Option<Reading>, now: DateTime<Utc>) -> Self {
        match current {
            Some(r) => Self {
                temperature: Some(r.value),
                timestamp: r.timestamp,
            },
            None => Self {
                temperature: None,
                timestamp: now,
            },
        }
    }
}

/// Fault notification pushed to live viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvent {
    pub message: String,
}

impl From<&Fault> for FaultEvent {
    fn from(fault: &Fault) -> Self {
        Self {
            message: fault.reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn current_with_reading_uses_reading_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 5, 0).unwrap();

        let body = CurrentTemperature::from_current(Some(Reading::new(22.0, ts)), now);

        assert_eq!(body.temperature, Some(22.0));
        assert_eq!(body.timestamp, ts);
    }

    #[test]
    fn current_without_reading_is_null() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 5, 0).unwrap();
        let body = CurrentTemperature::from_current(None, now);

        let json = serde_json::to_value(&body).unwrap();
        assert!(json["temperature"].is_null());
        assert_eq!(json["timestamp"], "2025-01-01T00:05:00.000Z");
    }

    #[test]
    fn fault_event_from_fault() {
        let event = FaultEvent::from(&Fault::new("sensor unplugged"));
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"message":"sensor unplugged"}"#);
    }
}
