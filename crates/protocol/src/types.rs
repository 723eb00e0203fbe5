use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// One sensor sample.
///
/// Serializes to the wire shape `{"temperature": 24.5, "timestamp": "…Z"}`
/// used by the live channel, the query API and the sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "temperature")]
    pub value: f64,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    /// Creates a reading stamped with the current time.
    ///
    /// The timestamp is truncated to milliseconds, the precision of the wire
    /// format, so a reading survives a JSON round trip unchanged.
    pub fn now(value: f64) -> Self {
        Self::new(value, Utc::now().trunc_subsecs(3))
    }
}

/// A domain-level sensor error (e.g. open thermocouple).
///
/// Faults are never stored in history; they only travel to live viewers.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl Fault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Serde module writing timestamps as ISO-8601 with millisecond precision.
///
/// Any RFC 3339 timestamp is accepted on input.
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{s}': {e}")))
    }
}
