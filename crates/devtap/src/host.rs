use std::fmt;
use std::sync::Arc;

use devtap_console_log::Console;
use devtap_network::{EventRequest, Fetch, HttpFetch, HttpRequest, RequestConstructor};

use crate::Debugger;

/// The process's patchable entry points.
///
/// Callers must go through these fields (not through their own copies) for
/// their calls to be observed once devtap is initialized.
pub struct Host {
    pub console: Console,
    pub fetch: Arc<dyn Fetch>,
    pub request_constructor: RequestConstructor,
    installed: Option<Debugger>,
}

impl Host {
    pub fn new(
        console: Console,
        fetch: Arc<dyn Fetch>,
        request_constructor: RequestConstructor,
    ) -> Self {
        Self {
            console,
            fetch,
            request_constructor,
            installed: None,
        }
    }

    /// The native host: `tracing` console and `reqwest` transports sharing
    /// one connection pool.
    pub fn native() -> Self {
        let client = reqwest::Client::new();
        let request_client = client.clone();
        Self::new(
            Console::tracing(),
            Arc::new(HttpFetch::with_client(client)),
            Arc::new(move || -> Box<dyn EventRequest> {
                Box::new(HttpRequest::new(request_client.clone()))
            }),
        )
    }

    /// A fresh event-style request object from the current constructor.
    pub fn request(&self) -> Box<dyn EventRequest> {
        (self.request_constructor)()
    }

    /// Whether interceptors have been installed.
    pub fn is_instrumented(&self) -> bool {
        self.installed.is_some()
    }

    pub(crate) fn installed(&self) -> Option<Debugger> {
        self.installed.clone()
    }

    pub(crate) fn mark_installed(&mut self, debugger: Debugger) {
        self.installed = Some(debugger);
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("console", &self.console)
            .field("instrumented", &self.is_instrumented())
            .finish_non_exhaustive()
    }
}
