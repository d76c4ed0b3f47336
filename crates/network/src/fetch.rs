//! Promise-style requests and their interceptor.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use devtap_log_store::LogStore;
use devtap_protocol::RequestKind;
use devtap_protocol::constants::DEFAULT_METHOD;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::body::decode_body;
use crate::error::NetworkError;
use crate::record::{InFlight, ResponseSummary, settle};

/// Future returned by [`Fetch::fetch`].
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<FetchResponse, NetworkError>> + Send + 'a>>;

/// A promise-based request function.
///
/// Hosts implement this on top of their transport; interceptors implement
/// it on top of another `Fetch`.
pub trait Fetch: Send + Sync {
    /// Issues the request and resolves once the response head and body are
    /// available, or with the transport failure.
    fn fetch(&self, request: FetchRequest) -> FetchFuture<'_>;
}

impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    fn fetch(&self, request: FetchRequest) -> FetchFuture<'_> {
        (**self).fetch(request)
    }
}

/// Options of a promise-style call. Every field may be left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

/// Target and options of a promise-style call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub init: RequestInit,
}

impl FetchRequest {
    /// A request with no options (a plain `GET`).
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_init(url, RequestInit::default())
    }

    pub fn with_init(url: impl Into<String>, init: RequestInit) -> Self {
        Self {
            url: url.into(),
            init,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.init.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.init.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.init.body = Some(body);
        self
    }

    /// The method that will be used, `GET` when none or an empty one was
    /// given.
    pub fn effective_method(&self) -> &str {
        self.init
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_METHOD)
    }
}

/// Response of a promise-style call.
///
/// The body is reference-counted: cloning a response is cheap and gives an
/// independent reader, so one copy can be consumed while the other is
/// handed to the caller intact.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status in `[200, 300)`.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Headers in the order received.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Headers keyed by lowercase name; repeated headers are joined with `", "`.
    pub fn header_map(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &self.headers {
            map.entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.clone());
        }
        map
    }

    /// Consumes the response, returning the raw body.
    pub fn bytes(self) -> Bytes {
        self.body
    }

    /// Consumes the response, returning the body as (lossy) UTF-8 text.
    pub fn text(self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Consumes the response, decoding the body as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A [`Fetch`] that records every call made through it.
///
/// Responses and failures of the wrapped `Fetch` are passed through
/// unchanged; the record is appended once the call has settled.
pub struct InterceptedFetch<F> {
    inner: F,
    store: LogStore,
}

impl<F> InterceptedFetch<F> {
    pub fn new(inner: F, store: LogStore) -> Self {
        Self { inner, store }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: Fetch> Fetch for InterceptedFetch<F> {
    fn fetch(&self, request: FetchRequest) -> FetchFuture<'_> {
        let flight = InFlight::start(
            RequestKind::Fetch,
            request.effective_method(),
            request.url.clone(),
            request.init.headers.clone(),
            request.init.body.clone(),
        );

        Box::pin(async move {
            match self.inner.fetch(request).await {
                Ok(response) => {
                    settle(&self.store, flight.succeed(summarize(&response)));
                    Ok(response)
                }
                Err(e) => {
                    settle(&self.store, flight.fail(e.to_string()));
                    Err(e)
                }
            }
        })
    }
}

/// Reads status, headers and body from a clone so `response` stays unread.
fn summarize(response: &FetchResponse) -> ResponseSummary {
    let inspected = response.clone();
    let status = inspected.status();
    let status_text = inspected.status_text().to_string();
    let headers = inspected.header_map();
    let content_type = inspected.header("content-type").map(str::to_string);
    let body = decode_body(content_type.as_deref(), &inspected.bytes());
    ResponseSummary {
        status,
        status_text,
        headers,
        body,
    }
}
