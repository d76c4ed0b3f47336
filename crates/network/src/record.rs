//! In-flight network records.

use std::collections::BTreeMap;

use devtap_log_store::LogStore;
use devtap_protocol::constants::{NO_RESPONSE_STATUS, NO_RESPONSE_STATUS_TEXT};
use devtap_protocol::{NetworkRecord, RequestKind, new_record_id, now_millis};
use serde_json::Value;

use crate::diagnostics;
use crate::parse::parse_query;

/// Response details captured when a call settles successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSummary {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// A record under construction for a call that has not settled yet.
///
/// Settling consumes it, so each call yields at most one [`NetworkRecord`].
#[derive(Debug)]
pub struct InFlight {
    record: NetworkRecord,
}

impl InFlight {
    /// Starts the clock for a call issued now.
    pub fn start(
        kind: RequestKind,
        method: impl Into<String>,
        url: impl Into<String>,
        request_headers: BTreeMap<String, String>,
        request_body: Option<Value>,
    ) -> Self {
        let url = url.into();
        let start = now_millis();
        Self {
            record: NetworkRecord {
                id: new_record_id(),
                timestamp: start,
                kind,
                method: method.into(),
                request_query: parse_query(&url),
                url,
                request_headers,
                request_body,
                status: None,
                status_text: None,
                response_headers: BTreeMap::new(),
                response_body: None,
                start_time: start,
                end_time: None,
                duration: None,
                error: None,
            },
        }
    }

    /// The record as captured so far.
    pub fn record(&self) -> &NetworkRecord {
        &self.record
    }

    /// Settles with a response.
    pub fn succeed(mut self, response: ResponseSummary) -> NetworkRecord {
        self.stop_clock();
        self.record.status = Some(response.status);
        self.record.status_text = Some(response.status_text);
        self.record.response_headers = response.headers;
        self.record.response_body = Some(response.body);
        self.record
    }

    /// Settles without a response.
    pub fn fail(mut self, error: impl Into<String>) -> NetworkRecord {
        self.stop_clock();
        self.record.status = Some(NO_RESPONSE_STATUS);
        self.record.status_text = Some(NO_RESPONSE_STATUS_TEXT.to_string());
        self.record.error = Some(error.into());
        self.record
    }

    // Wall-clock steps backwards are clamped so duration stays >= 0.
    fn stop_clock(&mut self) {
        let end = now_millis().max(self.record.start_time);
        self.record.end_time = Some(end);
        self.record.duration = Some(end - self.record.start_time);
    }
}

/// Appends a settled record and emits its diagnostic group.
pub(crate) fn settle(store: &LogStore, record: NetworkRecord) {
    store.push_network_log(record.clone());
    diagnostics::report(&record);
}
