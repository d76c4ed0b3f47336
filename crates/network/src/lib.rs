//! Network interception.
//!
//! Two decorators, one per host request mechanism:
//!
//! - [`InterceptedFetch`] wraps any [`Fetch`] (promise-style: one call, one
//!   awaited outcome).
//! - [`ObservedRequest`] wraps any [`EventRequest`] (event-style: open, set
//!   headers, send, then `load`/`error` events).
//!
//! Both build an [`InFlight`] record when the call starts and append the
//! settled [`NetworkRecord`] to the [`LogStore`] exactly once. Outcomes seen
//! by the caller are never altered: responses are returned as-is and
//! transport failures are handed back unchanged.
//!
//! [`NetworkRecord`]: devtap_protocol::NetworkRecord
//! [`LogStore`]: devtap_log_store::LogStore

pub mod body;
mod diagnostics;
pub mod error;
pub mod fetch;
pub mod http;
pub mod parse;
pub mod record;
pub mod xhr;

pub use error::NetworkError;
pub use fetch::{Fetch, FetchFuture, FetchRequest, FetchResponse, InterceptedFetch, RequestInit};
pub use http::{HttpFetch, HttpRequest};
pub use record::{InFlight, ResponseSummary};
pub use xhr::{
    EventRequest, Listener, ObservedRequest, RequestConstructor, RequestEvent, ResponseState,
    observe_constructor, observe_requests,
};
