use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use devtap_protocol::{ConsoleRecord, LogLevel, NetworkRecord, StatusFilter};

use crate::buffer::AppendLog;

#[derive(Debug, Default)]
struct Logs {
    console: AppendLog<ConsoleRecord>,
    network: AppendLog<NetworkRecord>,
}

/// Shared handle to the console and network record buffers.
///
/// Cloning is cheap and every clone sees the same buffers. Interceptors
/// append through their clone while UI collaborators read through theirs.
/// All reads return owned snapshots.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    inner: Arc<Mutex<Logs>>,
}

impl LogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic in another holder must not stop capture, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Logs> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a console record.
    pub fn push_log(&self, record: ConsoleRecord) {
        self.lock().console.push(record);
    }

    /// Every console record, in append order.
    pub fn logs(&self) -> Vec<ConsoleRecord> {
        self.lock().console.snapshot()
    }

    /// Console records whose level is exactly `level`.
    pub fn logs_by_level(&self, level: LogLevel) -> Vec<ConsoleRecord> {
        self.lock().console.filtered(|r| r.level == level)
    }

    /// Number of buffered console records.
    pub fn log_count(&self) -> usize {
        self.lock().console.len()
    }

    /// Drop every console record. Snapshots already taken are unaffected.
    pub fn clear_logs(&self) {
        let mut logs = self.lock();
        let dropped = logs.console.len();
        logs.console.clear();
        tracing::debug!(dropped, "console records cleared");
    }

    /// Append a settled network record.
    pub fn push_network_log(&self, record: NetworkRecord) {
        self.lock().network.push(record);
    }

    /// Every network record, in append order.
    pub fn network_logs(&self) -> Vec<NetworkRecord> {
        self.lock().network.snapshot()
    }

    /// Network records in the given outcome bucket.
    pub fn network_logs_by_status(&self, filter: StatusFilter) -> Vec<NetworkRecord> {
        self.lock().network.filtered(|r| filter.matches(r))
    }

    /// Number of buffered network records.
    pub fn network_log_count(&self) -> usize {
        self.lock().network.len()
    }

    /// Drop every network record. Snapshots already taken are unaffected.
    pub fn clear_network_logs(&self) {
        let mut logs = self.lock();
        let dropped = logs.network.len();
        logs.network.clear();
        tracing::debug!(dropped, "network records cleared");
    }
}
