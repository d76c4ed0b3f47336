use std::fmt;
use std::sync::Arc;

use devtap_log_store::LogStore;
use devtap_protocol::LogLevel;
use serde_json::Value;

use crate::format::{build_record, format_message};

/// One logging entry point of the host.
pub type LogFn = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Wraps `original` so each call first appends a record for `level` to
/// `store`, then forwards the untouched arguments.
///
/// The wrapper returns whatever `original` returns, and a panic inside
/// `original` unwinds through the wrapper unchanged (the record is already
/// stored by then).
pub fn intercept<F, R>(
    level: LogLevel,
    store: LogStore,
    original: F,
) -> impl Fn(&[Value]) -> R + Send + Sync + 'static
where
    F: Fn(&[Value]) -> R + Send + Sync + 'static,
{
    move |args: &[Value]| {
        store.push_log(build_record(level, args));
        original(args)
    }
}

/// The host's table of logging entry points.
///
/// Entry points are plain values: replacing one means building a new table
/// (or calling [`Console::set_entry`]) rather than patching a global.
#[derive(Clone)]
pub struct Console {
    log: LogFn,
    info: LogFn,
    warn: LogFn,
    error: LogFn,
    debug: LogFn,
}

impl Console {
    /// Builds a table whose five entry points all delegate to `f`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(LogLevel, &[Value]) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let entry = |level: LogLevel| -> LogFn {
            let f = Arc::clone(&f);
            Arc::new(move |args: &[Value]| f(level, args))
        };
        Self {
            log: entry(LogLevel::Log),
            info: entry(LogLevel::Info),
            warn: entry(LogLevel::Warn),
            error: entry(LogLevel::Error),
            debug: entry(LogLevel::Debug),
        }
    }

    /// The native console of a Rust host: every call becomes a `tracing`
    /// event with target `console`.
    pub fn tracing() -> Self {
        Self::from_fn(emit_tracing)
    }

    /// The entry point for `level`.
    pub fn entry(&self, level: LogLevel) -> &LogFn {
        match level {
            LogLevel::Log => &self.log,
            LogLevel::Info => &self.info,
            LogLevel::Warn => &self.warn,
            LogLevel::Error => &self.error,
            LogLevel::Debug => &self.debug,
        }
    }

    /// Replaces the entry point for `level`.
    pub fn set_entry(&mut self, level: LogLevel, f: LogFn) {
        let slot = match level {
            LogLevel::Log => &mut self.log,
            LogLevel::Info => &mut self.info,
            LogLevel::Warn => &mut self.warn,
            LogLevel::Error => &mut self.error,
            LogLevel::Debug => &mut self.debug,
        };
        *slot = f;
    }

    /// Returns a table whose entry points record into `store` before
    /// delegating to the entry points of `self`.
    ///
    /// Not idempotent: intercepting an intercepted table records every
    /// call twice.
    pub fn intercepted(&self, store: &LogStore) -> Console {
        let mut wrapped = self.clone();
        for level in LogLevel::ALL {
            let original = Arc::clone(self.entry(level));
            let f = intercept(level, store.clone(), move |args: &[Value]| original(args));
            wrapped.set_entry(level, Arc::new(f));
        }
        wrapped
    }

    /// Calls the entry point for `level`.
    pub fn call(&self, level: LogLevel, args: &[Value]) {
        (self.entry(level))(args)
    }

    pub fn log(&self, args: &[Value]) {
        self.call(LogLevel::Log, args)
    }

    pub fn info(&self, args: &[Value]) {
        self.call(LogLevel::Info, args)
    }

    pub fn warn(&self, args: &[Value]) {
        self.call(LogLevel::Warn, args)
    }

    pub fn error(&self, args: &[Value]) {
        self.call(LogLevel::Error, args)
    }

    pub fn debug(&self, args: &[Value]) {
        self.call(LogLevel::Debug, args)
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

fn emit_tracing(level: LogLevel, args: &[Value]) {
    let message = format_message(args);
    match level {
        LogLevel::Log | LogLevel::Info => tracing::info!(target: "console", "{message}"),
        LogLevel::Warn => tracing::warn!(target: "console", "{message}"),
        LogLevel::Error => tracing::error!(target: "console", "{message}"),
        LogLevel::Debug => tracing::debug!(target: "console", "{message}"),
    }
}
