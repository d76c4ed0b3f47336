fn main() {
    println!("Run `cargo test -p record-compat` to execute export format tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use devtap_protocol::constants::NO_RESPONSE_STATUS_TEXT;
    use devtap_protocol::{
        ConsoleRecord, DebugOptions, LogLevel, NetworkRecord, Position, RequestKind,
        StatusFilter, Theme,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it and compares the JSON values.
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
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  export: {fixture}\n  Rust:   {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_console_logs() {
        let logs: Vec<ConsoleRecord> = roundtrip_test("console_logs.json");
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[1].data, Some(serde_json::json!({"code": 500})));
        assert!(logs[2].data.is_none());
        assert!(logs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn fixture_network_fetch() {
        let record: NetworkRecord = roundtrip_test("network_fetch.json");
        assert_eq!(record.kind, RequestKind::Fetch);
        assert_eq!(record.request_query["limit"], "5");
        assert_eq!(record.timestamp, record.start_time);
        assert_eq!(
            record.duration,
            record.end_time.map(|end| end - record.start_time)
        );
        assert!(StatusFilter::Success.matches(&record));
    }

    #[test]
    fn fixture_network_xhr_failure() {
        let record: NetworkRecord = roundtrip_test("network_xhr_failure.json");
        assert_eq!(record.kind, RequestKind::Xhr);
        assert_eq!(record.status, Some(0));
        assert_eq!(record.status_text.as_deref(), Some(NO_RESPONSE_STATUS_TEXT));
        assert!(record.response_headers.is_empty());
        assert!(record.response_body.is_none());
        assert!(StatusFilter::Failure.matches(&record));
        assert!(!StatusFilter::Success.matches(&record));
    }

    #[test]
    fn fixture_debug_options() {
        let options: DebugOptions = roundtrip_test("debug_options.json");
        assert_eq!(options.position, Position::TopLeft);
        assert_eq!(options.theme, Theme::Auto);
    }

    #[test]
    fn export_without_optional_fields() {
        // Older exports omit every optional key.
        let minimal = serde_json::json!({
            "id": "x",
            "timestamp": 1,
            "type": "fetch",
            "method": "GET",
            "url": "/relative",
            "startTime": 1
        });
        let record: NetworkRecord = serde_json::from_value(minimal).unwrap();
        assert!(record.request_query.is_empty());
        assert!(record.status.is_none());
        assert!(!StatusFilter::Success.matches(&record));
        assert!(!StatusFilter::Failure.matches(&record));
        assert!(StatusFilter::All.matches(&record));
    }

    #[test]
    fn empty_options_take_defaults() {
        let options: DebugOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, DebugOptions::default());
    }
}
