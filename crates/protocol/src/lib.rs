//! Record model shared by every devtap crate.
//!
//! Pure data: console records, network records, the query filters used to
//! read them back, and the options accepted at initialization. Serialized
//! field names follow the JSON export format (camelCase).

pub mod console_log;
pub mod constants;
pub mod error;
pub mod network;
pub mod options;

pub use console_log::{ConsoleRecord, LogLevel};
pub use error::ProtocolError;
pub use network::{NetworkRecord, RequestKind, StatusFilter};
pub use options::{DebugOptions, Position, Theme};

/// Returns a fresh record identifier, unique for the lifetime of the process.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
