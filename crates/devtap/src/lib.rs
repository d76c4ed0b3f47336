//! devtap: in-process console and network instrumentation.
//!
//! A [`Host`] holds the process's patchable entry points (five logging
//! functions, a promise-style request function, an event-style request
//! constructor). [`Debugger::init`] wraps all of them once so every call is
//! recorded into a shared [`LogStore`], then hands that store to a
//! [`DebugUi`] collaborator.
//!
//! ```no_run
//! use devtap::{DebugOptions, Debugger, Host, NoUi};
//!
//! let mut host = Host::native();
//! let debugger = Debugger::init(&mut host, DebugOptions::default(), &mut NoUi);
//! host.console.info(&[serde_json::json!("ready")]);
//! assert_eq!(debugger.logs().len(), 1);
//! ```

mod host;

use std::sync::Arc;

use devtap_network::{InterceptedFetch, observe_constructor};

pub use devtap_console_log::Console;
pub use devtap_log_store::LogStore;
pub use devtap_network::{
    EventRequest, Fetch, FetchRequest, FetchResponse, NetworkError, RequestConstructor,
    RequestEvent, ResponseState,
};
pub use devtap_protocol::{
    ConsoleRecord, DebugOptions, LogLevel, NetworkRecord, Position, RequestKind, StatusFilter,
    Theme,
};
pub use host::Host;

/// External collaborator (trigger control, exporter, ...) that receives the
/// live store once interception is installed.
pub trait DebugUi {
    fn mount(&mut self, options: &DebugOptions, store: LogStore);
}

/// A collaborator that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUi;

impl DebugUi for NoUi {
    fn mount(&mut self, _options: &DebugOptions, _store: LogStore) {}
}

/// Handle to an installed instrumentation layer.
#[derive(Debug, Clone)]
pub struct Debugger {
    store: LogStore,
    options: DebugOptions,
}

impl Debugger {
    /// Installs the console and network interceptors into `host` and mounts
    /// `ui` on the new store.
    ///
    /// Installation happens once per host. Later calls leave the host and
    /// `ui` untouched and return a handle to the store already installed.
    pub fn init(host: &mut Host, options: DebugOptions, ui: &mut dyn DebugUi) -> Self {
        if let Some(existing) = host.installed() {
            tracing::warn!("devtap already initialized, keeping existing interceptors");
            return existing;
        }

        let store = LogStore::new();
        host.console = host.console.intercepted(&store);
        host.fetch = Arc::new(InterceptedFetch::new(Arc::clone(&host.fetch), store.clone()));
        host.request_constructor =
            observe_constructor(store.clone(), Arc::clone(&host.request_constructor));

        let debugger = Debugger { store, options };
        host.mark_installed(debugger.clone());

        ui.mount(&debugger.options, debugger.store.clone());
        tracing::info!(
            position = ?options.position,
            theme = ?options.theme,
            "devtap initialized"
        );
        debugger
    }

    /// All console records, oldest first.
    pub fn logs(&self) -> Vec<ConsoleRecord> {
        self.store.logs()
    }

    pub fn logs_by_level(&self, level: LogLevel) -> Vec<ConsoleRecord> {
        self.store.logs_by_level(level)
    }

    pub fn clear_logs(&self) {
        self.store.clear_logs()
    }

    /// All network records, in settlement order.
    pub fn network_logs(&self) -> Vec<NetworkRecord> {
        self.store.network_logs()
    }

    pub fn network_logs_by_status(&self, filter: StatusFilter) -> Vec<NetworkRecord> {
        self.store.network_logs_by_status(filter)
    }

    pub fn clear_network_logs(&self) {
        self.store.clear_network_logs()
    }

    pub fn options(&self) -> &DebugOptions {
        &self.options
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }
}
