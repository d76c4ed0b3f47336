//! Message derivation for console records.

use devtap_protocol::{ConsoleRecord, LogLevel, new_record_id, now_millis};
use serde_json::Value;

/// Renders one argument: strings as themselves, everything else as
/// canonical JSON text.
fn arg_text(arg: &Value) -> String {
    match arg {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders every argument and joins the pieces with a single space.
pub fn format_message(args: &[Value]) -> String {
    args.iter().map(arg_text).collect::<Vec<_>>().join(" ")
}

/// Builds the record for one logging call, stamped with the current time.
pub fn build_record(level: LogLevel, args: &[Value]) -> ConsoleRecord {
    ConsoleRecord {
        id: new_record_id(),
        timestamp: now_millis(),
        level,
        message: format_message(args),
        data: args.first().cloned(),
    }
}
