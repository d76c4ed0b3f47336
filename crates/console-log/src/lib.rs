//! Console interception.
//!
//! Wraps the host's five logging entry points (`log`, `info`, `warn`,
//! `error`, `debug`) so every call also produces a [`ConsoleRecord`] in the
//! [`LogStore`]. The wrapped functions keep their arguments, return values
//! and side effects.
//!
//! [`ConsoleRecord`]: devtap_protocol::ConsoleRecord
//! [`LogStore`]: devtap_log_store::LogStore

mod console;
mod format;

pub use console::{Console, LogFn, intercept};
pub use format::{build_record, format_message};
