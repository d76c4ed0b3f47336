//! Event-style requests and their observer.
//!
//! An [`EventRequest`] is configured with `open` and `set_request_header`,
//! started with `send`, and reports completion through `load` or `error`
//! listeners. [`ObservedRequest`] wraps one by composition: it mirrors the
//! configuration calls, forwards everything to the wrapped object, and
//! attaches its own listeners at `send` time.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use devtap_log_store::LogStore;
use devtap_protocol::RequestKind;
use devtap_protocol::constants::NETWORK_ERROR;
use serde_json::Value;

use crate::body::decode_body;
use crate::error::NetworkError;
use crate::parse::parse_header_blob;
use crate::record::{InFlight, ResponseSummary, settle};

/// Completion events of an [`EventRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestEvent {
    /// A response (any status) was received.
    Load,
    /// No response: transport failure or abort.
    Error,
}

/// Response-side view of an event-style request.
pub trait ResponseState {
    fn status(&self) -> u16;
    fn status_text(&self) -> String;
    /// A single header, matched case-insensitively.
    fn response_header(&self, name: &str) -> Option<String>;
    /// All headers as a CRLF-separated `name: value` blob.
    fn all_response_headers(&self) -> String;
    fn response_text(&self) -> String;
}

/// Callback attached with [`EventRequest::add_event_listener`].
pub type Listener = Box<dyn FnMut(&dyn ResponseState) + Send>;

/// An event-based request object.
pub trait EventRequest: ResponseState + Send {
    fn open(&mut self, method: &str, url: &str);
    fn set_request_header(&mut self, name: &str, value: &str);
    fn add_event_listener(&mut self, event: RequestEvent, listener: Listener);
    /// Starts the request. Completion is reported through listeners; an
    /// `Err` here means the request never started.
    fn send(&mut self, body: Option<Value>) -> Result<(), NetworkError>;
    fn abort(&mut self);
}

impl<R: ResponseState + ?Sized> ResponseState for Box<R> {
    fn status(&self) -> u16 {
        (**self).status()
    }

    fn status_text(&self) -> String {
        (**self).status_text()
    }

    fn response_header(&self, name: &str) -> Option<String> {
        (**self).response_header(name)
    }

    fn all_response_headers(&self) -> String {
        (**self).all_response_headers()
    }

    fn response_text(&self) -> String {
        (**self).response_text()
    }
}

impl<R: EventRequest + ?Sized> EventRequest for Box<R> {
    fn open(&mut self, method: &str, url: &str) {
        (**self).open(method, url)
    }

    fn set_request_header(&mut self, name: &str, value: &str) {
        (**self).set_request_header(name, value)
    }

    fn add_event_listener(&mut self, event: RequestEvent, listener: Listener) {
        (**self).add_event_listener(event, listener)
    }

    fn send(&mut self, body: Option<Value>) -> Result<(), NetworkError> {
        (**self).send(body)
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

/// Factory producing fresh request objects.
pub type RequestConstructor = Arc<dyn Fn() -> Box<dyn EventRequest> + Send + Sync>;

/// Shared between the load and error observers of one `send`; whichever
/// fires first takes the record.
type Slot = Arc<Mutex<Option<InFlight>>>;

/// An [`EventRequest`] that records each `send` it performs.
pub struct ObservedRequest<R> {
    inner: R,
    store: LogStore,
    opened: Option<(String, String)>,
    headers: BTreeMap<String, String>,
}

impl<R: EventRequest> ObservedRequest<R> {
    pub fn new(inner: R, store: LogStore) -> Self {
        Self {
            inner,
            store,
            opened: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn observer(&self, slot: &Slot, event: RequestEvent) -> Listener {
        let slot = Arc::clone(slot);
        let store = self.store.clone();
        Box::new(move |state: &dyn ResponseState| {
            let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            let Some(flight) = taken else {
                return;
            };
            let record = match event {
                RequestEvent::Load => flight.succeed(summarize(state)),
                RequestEvent::Error => flight.fail(NETWORK_ERROR),
            };
            settle(&store, record);
        })
    }
}

impl<R: EventRequest> ResponseState for ObservedRequest<R> {
    fn status(&self) -> u16 {
        self.inner.status()
    }

    fn status_text(&self) -> String {
        self.inner.status_text()
    }

    fn response_header(&self, name: &str) -> Option<String> {
        self.inner.response_header(name)
    }

    fn all_response_headers(&self) -> String {
        self.inner.all_response_headers()
    }

    fn response_text(&self) -> String {
        self.inner.response_text()
    }
}

impl<R: EventRequest> EventRequest for ObservedRequest<R> {
    fn open(&mut self, method: &str, url: &str) {
        self.opened = Some((method.to_string(), url.to_string()));
        self.headers.clear();
        self.inner.open(method, url);
    }

    fn set_request_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
        self.inner.set_request_header(name, value);
    }

    fn add_event_listener(&mut self, event: RequestEvent, listener: Listener) {
        self.inner.add_event_listener(event, listener);
    }

    fn send(&mut self, body: Option<Value>) -> Result<(), NetworkError> {
        let Some((method, url)) = self.opened.clone() else {
            // Nothing to describe; let the wrapped object report the misuse.
            return self.inner.send(body);
        };

        let flight = InFlight::start(
            RequestKind::Xhr,
            method,
            url,
            self.headers.clone(),
            body.clone(),
        );
        let slot: Slot = Arc::new(Mutex::new(Some(flight)));
        let on_load = self.observer(&slot, RequestEvent::Load);
        let on_error = self.observer(&slot, RequestEvent::Error);
        self.inner.add_event_listener(RequestEvent::Load, on_load);
        self.inner.add_event_listener(RequestEvent::Error, on_error);

        let sent = self.inner.send(body);
        if sent.is_err() {
            // Never started: no record.
            slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
        sent
    }

    fn abort(&mut self) {
        self.inner.abort();
    }
}

fn summarize(state: &dyn ResponseState) -> ResponseSummary {
    let content_type = state.response_header("content-type");
    let text = state.response_text();
    ResponseSummary {
        status: state.status(),
        status_text: state.status_text(),
        headers: parse_header_blob(&state.all_response_headers()),
        body: decode_body(content_type.as_deref(), text.as_bytes()),
    }
}

/// Wraps a request factory so every object it produces is observed.
pub fn observe_requests<F, R>(
    store: LogStore,
    constructor: F,
) -> impl Fn() -> ObservedRequest<R> + Send + Sync + 'static
where
    F: Fn() -> R + Send + Sync + 'static,
    R: EventRequest + 'static,
{
    move || ObservedRequest::new(constructor(), store.clone())
}

/// [`observe_requests`] for type-erased factories.
pub fn observe_constructor(store: LogStore, constructor: RequestConstructor) -> RequestConstructor {
    Arc::new(move || -> Box<dyn EventRequest> {
        Box::new(ObservedRequest::new(constructor(), store.clone()))
    })
}

#[cfg(test)]
mod tests {
    use devtap_protocol::StatusFilter;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MockState {
        opened: Option<(String, String)>,
        headers: Vec<(String, String)>,
        sent: Vec<Option<Value>>,
        listeners: Vec<(RequestEvent, Listener)>,
        aborted: bool,
        fail_send: bool,
    }

    /// Canned response handed to listeners.
    #[derive(Clone)]
    struct MockResponse {
        status: u16,
        status_text: String,
        headers: Vec<(String, String)>,
        text: String,
    }

    impl MockResponse {
        fn json(status: u16, text: &str) -> Self {
            Self {
                status,
                status_text: "OK".into(),
                headers: vec![("Content-Type".into(), "application/json".into())],
                text: text.into(),
            }
        }

        fn none() -> Self {
            Self {
                status: 0,
                status_text: String::new(),
                headers: Vec::new(),
                text: String::new(),
            }
        }
    }

    impl ResponseState for MockResponse {
        fn status(&self) -> u16 {
            self.status
        }

        fn status_text(&self) -> String {
            self.status_text.clone()
        }

        fn response_header(&self, name: &str) -> Option<String> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        }

        fn all_response_headers(&self) -> String {
            self.headers
                .iter()
                .map(|(n, v)| format!("{n}: {v}\r\n"))
                .collect()
        }

        fn response_text(&self) -> String {
            self.text.clone()
        }
    }

    /// Request object whose state the test keeps a handle to.
    #[derive(Clone, Default)]
    struct MockRequest {
        state: Arc<Mutex<MockState>>,
    }

    impl MockRequest {
        fn failing() -> Self {
            let request = Self::default();
            request.state.lock().unwrap().fail_send = true;
            request
        }

        fn fire(&self, event: RequestEvent, response: &MockResponse) {
            let mut listeners = std::mem::take(&mut self.state.lock().unwrap().listeners);
            for (on, listener) in listeners.iter_mut() {
                if *on == event {
                    listener(response);
                }
            }
        }

        fn listener_count(&self) -> usize {
            self.state.lock().unwrap().listeners.len()
        }
    }

    impl ResponseState for MockRequest {
        fn status(&self) -> u16 {
            0
        }

        fn status_text(&self) -> String {
            String::new()
        }

        fn response_header(&self, _name: &str) -> Option<String> {
            None
        }

        fn all_response_headers(&self) -> String {
            String::new()
        }

        fn response_text(&self) -> String {
            String::new()
        }
    }

    impl EventRequest for MockRequest {
        fn open(&mut self, method: &str, url: &str) {
            self.state.lock().unwrap().opened = Some((method.into(), url.into()));
        }

        fn set_request_header(&mut self, name: &str, value: &str) {
            self.state
                .lock()
                .unwrap()
                .headers
                .push((name.into(), value.into()));
        }

        fn add_event_listener(&mut self, event: RequestEvent, listener: Listener) {
            self.state.lock().unwrap().listeners.push((event, listener));
        }

        fn send(&mut self, body: Option<Value>) -> Result<(), NetworkError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_send {
                return Err(NetworkError::InvalidRequest("send rejected".into()));
            }
            if state.opened.is_none() {
                return Err(NetworkError::NotOpened);
            }
            state.sent.push(body);
            Ok(())
        }

        fn abort(&mut self) {
            self.state.lock().unwrap().aborted = true;
        }
    }

    #[test]
    fn load_records_response() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        request.open("POST", "https://api.example.com/items?page=2");
        request.set_request_header("content-type", "application/json");
        request.send(Some(json!({"name": "widget"}))).unwrap();
        assert_eq!(store.network_log_count(), 0);

        mock.fire(RequestEvent::Load, &MockResponse::json(201, r#"{"id":7}"#));

        let records = store.network_logs();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind, RequestKind::Xhr);
        assert_eq!(record.method, "POST");
        assert_eq!(record.request_query["page"], "2");
        assert_eq!(record.request_headers["content-type"], "application/json");
        assert_eq!(record.request_body, Some(json!({"name": "widget"})));
        assert_eq!(record.status, Some(201));
        assert_eq!(record.response_headers["content-type"], "application/json");
        assert_eq!(record.response_body, Some(json!({"id": 7})));
        assert!(record.error.is_none());
    }

    #[test]
    fn calls_are_forwarded_to_inner() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store);

        request.open("GET", "https://example.com/");
        request.set_request_header("x-trace", "abc");
        request.send(None).unwrap();
        request.abort();

        let state = mock.state.lock().unwrap();
        assert_eq!(
            state.opened,
            Some(("GET".to_string(), "https://example.com/".to_string()))
        );
        assert_eq!(state.headers, vec![("x-trace".to_string(), "abc".to_string())]);
        assert_eq!(state.sent, vec![None]);
        assert!(state.aborted);
    }

    #[test]
    fn error_event_records_network_error() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        request.open("GET", "https://unreachable.invalid/");
        request.send(None).unwrap();
        mock.fire(RequestEvent::Error, &MockResponse::none());

        let record = &store.network_logs()[0];
        assert_eq!(record.status, Some(0));
        assert_eq!(record.error.as_deref(), Some(NETWORK_ERROR));
        assert_eq!(store.network_logs_by_status(StatusFilter::Failure).len(), 1);
    }

    #[test]
    fn caller_listeners_still_fire() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        request.add_event_listener(
            RequestEvent::Load,
            Box::new(move |state: &dyn ResponseState| {
                sink.lock().unwrap().push(state.response_text());
            }),
        );
        request.open("GET", "https://example.com/data");
        request.send(None).unwrap();
        mock.fire(RequestEvent::Load, &MockResponse::json(200, "[1]"));

        assert_eq!(*seen.lock().unwrap(), vec!["[1]".to_string()]);
        assert_eq!(store.network_log_count(), 1);
    }

    #[test]
    fn settles_once_when_both_events_fire() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        request.open("GET", "https://example.com/");
        request.send(None).unwrap();

        // Fire both while holding the listeners, as a misbehaving host might.
        let mut listeners = std::mem::take(&mut mock.state.lock().unwrap().listeners);
        for (event, listener) in listeners.iter_mut() {
            match event {
                RequestEvent::Load => listener(&MockResponse::json(200, "{}")),
                RequestEvent::Error => listener(&MockResponse::none()),
            }
        }

        let records = store.network_logs();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Some(200));
    }

    #[test]
    fn rejected_send_records_nothing() {
        let store = LogStore::new();
        let mock = MockRequest::failing();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        request.open("GET", "https://example.com/");
        let err = request.send(None).unwrap_err();

        assert_eq!(err, NetworkError::InvalidRequest("send rejected".into()));
        mock.fire(RequestEvent::Error, &MockResponse::none());
        assert_eq!(store.network_log_count(), 0);
    }

    #[test]
    fn send_before_open_is_passed_through() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        assert_eq!(request.send(None), Err(NetworkError::NotOpened));
        assert_eq!(mock.listener_count(), 0);
        assert_eq!(store.network_log_count(), 0);
    }

    #[test]
    fn reopen_resets_headers() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        request.open("GET", "https://example.com/a");
        request.set_request_header("x-first", "1");
        request.open("PUT", "https://example.com/b");
        request.set_request_header("x-second", "2");
        request.send(Some(json!("raw"))).unwrap();
        mock.fire(RequestEvent::Load, &MockResponse::json(204, ""));

        let record = &store.network_logs()[0];
        assert_eq!(record.method, "PUT");
        assert_eq!(record.url, "https://example.com/b");
        assert_eq!(
            record.request_headers,
            BTreeMap::from([("x-second".to_string(), "2".to_string())])
        );
        // Empty JSON body fails to decode.
        assert_eq!(record.response_body, Some(Value::Null));
    }

    #[test]
    fn plain_text_response_kept_as_text() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let mut request = ObservedRequest::new(mock.clone(), store.clone());

        request.open("GET", "https://example.com/robots.txt");
        request.send(None).unwrap();
        mock.fire(
            RequestEvent::Load,
            &MockResponse {
                status: 404,
                status_text: "Not Found".into(),
                headers: vec![("Content-Type".into(), "text/plain".into())],
                text: "missing".into(),
            },
        );

        let record = &store.network_logs()[0];
        assert_eq!(record.response_body, Some(json!("missing")));
        assert_eq!(record.status_text.as_deref(), Some("Not Found"));
        assert!(record.is_failure());
    }

    #[test]
    fn constructors_produce_observed_requests() {
        let store = LogStore::new();
        let mock = MockRequest::default();
        let handle = mock.clone();
        let native: RequestConstructor = Arc::new(move || -> Box<dyn EventRequest> {
            Box::new(handle.clone())
        });
        let observed = observe_constructor(store.clone(), native);

        let mut request = observed();
        request.open("GET", "https://example.com/");
        request.send(None).unwrap();
        mock.fire(RequestEvent::Load, &MockResponse::json(200, "{}"));
        assert_eq!(store.network_log_count(), 1);

        let typed = observe_requests(store.clone(), MockRequest::default);
        let mut request = typed();
        request.open("GET", "https://example.com/other");
        request.send(None).unwrap();
        let inner = request.inner().clone();
        inner.fire(RequestEvent::Load, &MockResponse::json(200, "{}"));
        assert_eq!(store.network_log_count(), 2);
    }
}
