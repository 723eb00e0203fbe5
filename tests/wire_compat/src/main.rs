fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use thermowatch_protocol::{CurrentTemperature, LiveMessage, Reading};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// Browser clients write `100` where Rust writes `100.0`; both are the
    /// same temperature.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent, float-normalized comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    // --- Query payloads ---

    #[test]
    fn fixture_reading() {
        let reading = roundtrip_test::<Reading>("reading.json");
        assert_eq!(reading.value, 24.5);
    }

    #[test]
    fn fixture_current() {
        let current = roundtrip_test::<CurrentTemperature>("current.json");
        assert_eq!(current.temperature, Some(23.75));
    }

    #[test]
    fn fixture_current_null() {
        let current = roundtrip_test::<CurrentTemperature>("current_null.json");
        assert_eq!(current.temperature, None);
    }

    // --- Live channel frames ---

    #[test]
    fn fixture_live_temperature() {
        match roundtrip_test::<LiveMessage>("live_temperature.json") {
            LiveMessage::Temperature(r) => assert_eq!(r.value, 100.0),
            other => panic!("expected temperature frame, got {other:?}"),
        }
    }

    #[test]
    fn fixture_live_history() {
        match roundtrip_test::<LiveMessage>("live_history.json") {
            LiveMessage::TemperatureHistory(readings) => {
                let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
                assert_eq!(values, vec![21.25, 21.5, 22.0]);
                assert!(readings.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            }
            other => panic!("expected history frame, got {other:?}"),
        }
    }

    #[test]
    fn fixture_live_history_empty() {
        match roundtrip_test::<LiveMessage>("live_history_empty.json") {
            LiveMessage::TemperatureHistory(readings) => assert!(readings.is_empty()),
            other => panic!("expected history frame, got {other:?}"),
        }
    }

    #[test]
    fn fixture_live_error() {
        match roundtrip_test::<LiveMessage>("live_error.json") {
            LiveMessage::Error(event) => assert_eq!(event.message, "Thermocouple not connected!"),
            other => panic!("expected error frame, got {other:?}"),
        }
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        let raw = r#"{"type":"humidity","payload":{"value":40}}"#;
        assert!(serde_json::from_str::<LiveMessage>(raw).is_err());
    }
}
