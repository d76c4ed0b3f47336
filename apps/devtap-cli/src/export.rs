//! JSON export of the captured logs.

use std::path::{Path, PathBuf};

use devtap::{DebugOptions, DebugUi, LogStore};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("exporter is not mounted on a log store")]
    NotMounted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Collaborator that dumps both buffers to pretty-printed JSON files.
#[derive(Debug)]
pub struct JsonExport {
    dir: PathBuf,
    store: Option<LogStore>,
}

impl JsonExport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            store: None,
        }
    }

    /// Writes `console_logs_<ts>.json` and `network_logs_<ts>.json`,
    /// returning their paths.
    pub fn trigger(&self) -> Result<Vec<PathBuf>, ExportError> {
        let store = self.store.as_ref().ok_or(ExportError::NotMounted)?;
        std::fs::create_dir_all(&self.dir)?;

        // ISO-8601 with ':' replaced so the name is valid everywhere.
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let console = self.dir.join(format!("console_logs_{timestamp}.json"));
        let network = self.dir.join(format!("network_logs_{timestamp}.json"));

        write_json(&console, &store.logs())?;
        write_json(&network, &store.network_logs())?;

        tracing::info!(
            dir = %self.dir.display(),
            logs = store.log_count(),
            network_logs = store.network_log_count(),
            "logs exported"
        );
        Ok(vec![console, network])
    }
}

impl DebugUi for JsonExport {
    fn mount(&mut self, options: &DebugOptions, store: LogStore) {
        tracing::debug!(position = ?options.position, theme = ?options.theme, "exporter mounted");
        self.store = Some(store);
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use devtap::{ConsoleRecord, LogLevel, NetworkRecord};
    use serde_json::{Value, json};

    use super::*;

    fn record(level: LogLevel, message: &str) -> ConsoleRecord {
        ConsoleRecord {
            id: format!("id-{message}"),
            timestamp: 1_700_000_000_000,
            level,
            message: message.to_string(),
            data: Some(json!(message)),
        }
    }

    #[test]
    fn trigger_before_mount_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let export = JsonExport::new(tmp.path());
        assert!(matches!(export.trigger(), Err(ExportError::NotMounted)));
    }

    #[test]
    fn trigger_writes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let store = LogStore::new();
        store.push_log(record(LogLevel::Info, "hello"));
        store.push_log(record(LogLevel::Error, "boom"));

        let mut export = JsonExport::new(&dir);
        export.mount(&DebugOptions::default(), store.clone());
        let paths = export.trigger().unwrap();

        assert_eq!(paths.len(), 2);
        let console_name = paths[0].file_name().unwrap().to_string_lossy().into_owned();
        let network_name = paths[1].file_name().unwrap().to_string_lossy().into_owned();
        assert!(console_name.starts_with("console_logs_") && console_name.ends_with(".json"));
        assert!(network_name.starts_with("network_logs_") && network_name.ends_with(".json"));
        assert!(!console_name.contains(':'));

        let console: Vec<ConsoleRecord> =
            serde_json::from_str(&std::fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(console, store.logs());

        let network: Vec<NetworkRecord> =
            serde_json::from_str(&std::fs::read_to_string(&paths[1]).unwrap()).unwrap();
        assert!(network.is_empty());
    }

    #[test]
    fn export_is_pretty_printed_camel_case() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LogStore::new();
        store.push_log(record(LogLevel::Warn, "careful"));

        let mut export = JsonExport::new(tmp.path());
        export.mount(&DebugOptions::default(), store);
        let paths = export.trigger().unwrap();

        let text = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(text.contains("\n  {"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["level"], "warn");
        assert_eq!(value[0]["timestamp"], 1_700_000_000_000_i64);
    }
}
