//! Native request hosts backed by `reqwest`.
//!
//! [`HttpFetch`] is the process's promise-style request function and
//! [`HttpRequest`] its event-style request object. Both are plain hosts:
//! they record nothing themselves and are meant to be wrapped by
//! [`InterceptedFetch`](crate::InterceptedFetch) and
//! [`ObservedRequest`](crate::ObservedRequest).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::{Client, Method};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::NetworkError;
use crate::fetch::{Fetch, FetchFuture, FetchRequest, FetchResponse};
use crate::xhr::{EventRequest, Listener, RequestEvent, ResponseState};

/// Promise-style requests over a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetch {
    client: Client,
}

impl HttpFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetch {
    fn fetch(&self, request: FetchRequest) -> FetchFuture<'_> {
        Box::pin(execute(&self.client, request))
    }
}

/// Performs one request and reads the full body.
async fn execute(client: &Client, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
    let method = Method::from_bytes(request.effective_method().as_bytes())
        .map_err(|e| NetworkError::InvalidRequest(format!("{}: {e}", request.effective_method())))?;

    let mut builder = client.request(method, request.url.as_str());
    for (name, value) in &request.init.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.init.body {
        builder = builder.body(match body {
            Value::String(text) => text,
            other => other.to_string(),
        });
    }

    let response = builder.send().await?;
    let status = response.status();
    let mut out = FetchResponse::new(
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
    );
    for (name, value) in response.headers() {
        out = out.with_header(
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    let body = response.bytes().await?;
    Ok(out.with_body(body))
}

impl ResponseState for FetchResponse {
    fn status(&self) -> u16 {
        FetchResponse::status(self)
    }

    fn status_text(&self) -> String {
        FetchResponse::status_text(self).to_string()
    }

    fn response_header(&self, name: &str) -> Option<String> {
        self.header(name).map(str::to_string)
    }

    fn all_response_headers(&self) -> String {
        self.headers()
            .iter()
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect()
    }

    fn response_text(&self) -> String {
        String::from_utf8_lossy(&self.clone().bytes()).into_owned()
    }
}

#[derive(Default)]
struct Shared {
    listeners: Vec<(RequestEvent, Listener)>,
    response: Option<FetchResponse>,
    /// Number of sends issued so far.
    generation: u64,
    /// Generation of the send whose outcome is still pending, if any.
    in_flight: Option<u64>,
}

/// Event-style request object driven by a background task.
///
/// `send` must be called from within a Tokio runtime. Listeners run on the
/// runtime's worker, not on the caller's thread, except when the call is
/// interrupted: `abort` and a reopening `open` fire the `error` listeners
/// before returning. Only one send may be outstanding at a time.
pub struct HttpRequest {
    client: Client,
    opened: Option<(String, String)>,
    headers: BTreeMap<String, String>,
    shared: Arc<Mutex<Shared>>,
    cancel: Option<CancellationToken>,
}

impl HttpRequest {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            opened: None,
            headers: BTreeMap::new(),
            shared: Arc::default(),
            cancel: None,
        }
    }

    /// Cancels the outstanding send, if any, and settles it through the
    /// `error` listeners. Its late outcome is dropped.
    fn interrupt(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        let pending = self
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .take();
        if pending.is_some() {
            fire(&self.shared, Err(NetworkError::Aborted));
        }
    }

    fn with_response<T>(&self, read: impl FnOnce(&FetchResponse) -> T) -> Option<T> {
        let shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.response.as_ref().map(read)
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl ResponseState for HttpRequest {
    fn status(&self) -> u16 {
        self.with_response(ResponseState::status).unwrap_or_default()
    }

    fn status_text(&self) -> String {
        self.with_response(ResponseState::status_text)
            .unwrap_or_default()
    }

    fn response_header(&self, name: &str) -> Option<String> {
        self.with_response(|r| r.response_header(name)).flatten()
    }

    fn all_response_headers(&self) -> String {
        self.with_response(ResponseState::all_response_headers)
            .unwrap_or_default()
    }

    fn response_text(&self) -> String {
        self.with_response(ResponseState::response_text)
            .unwrap_or_default()
    }
}

impl EventRequest for HttpRequest {
    fn open(&mut self, method: &str, url: &str) {
        self.interrupt();
        self.opened = Some((method.to_string(), url.to_string()));
        self.headers.clear();
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .response = None;
    }

    fn set_request_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    fn add_event_listener(&mut self, event: RequestEvent, listener: Listener) {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .push((event, listener));
    }

    fn send(&mut self, body: Option<Value>) -> Result<(), NetworkError> {
        let (method, url) = self.opened.clone().ok_or(NetworkError::NotOpened)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| NetworkError::Transport(format!("no async runtime: {e}")))?;

        let generation = {
            let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
            if shared.in_flight.is_some() {
                return Err(NetworkError::InvalidRequest(
                    "send called while a request is in flight".into(),
                ));
            }
            shared.generation += 1;
            shared.in_flight = Some(shared.generation);
            shared.generation
        };

        let mut request = FetchRequest::new(url).method(method);
        request.init.headers = self.headers.clone();
        request.init.body = body;

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        let client = self.client.clone();
        let shared = Arc::clone(&self.shared);

        runtime.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(NetworkError::Aborted),
                result = execute(&client, request) => result,
            };
            complete(&shared, generation, outcome);
        });
        Ok(())
    }

    fn abort(&mut self) {
        self.interrupt();
    }
}

/// Delivers the outcome of send `generation` unless it was interrupted.
fn complete(
    shared: &Mutex<Shared>,
    generation: u64,
    outcome: Result<FetchResponse, NetworkError>,
) {
    {
        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.in_flight != Some(generation) {
            debug!(generation, "outcome of interrupted request dropped");
            return;
        }
        shared.in_flight = None;
    }
    fire(shared, outcome);
}

/// Fires the listeners for `outcome`, then keeps them for the next send.
fn fire(shared: &Mutex<Shared>, outcome: Result<FetchResponse, NetworkError>) {
    let (event, state) = match outcome {
        Ok(response) => (RequestEvent::Load, response),
        Err(e) => {
            debug!(error = %e, "event-style request failed");
            (RequestEvent::Error, FetchResponse::new(0, ""))
        }
    };

    let mut listeners = {
        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if event == RequestEvent::Load {
            shared.response = Some(state.clone());
        }
        std::mem::take(&mut shared.listeners)
    };

    for (on, listener) in listeners.iter_mut() {
        if *on == event {
            listener(&state);
        }
    }

    let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
    listeners.append(&mut shared.listeners);
    shared.listeners = listeners;
}
