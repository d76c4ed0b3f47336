use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Which host mechanism issued a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Promise-based request function.
    #[serde(rename = "fetch")]
    Fetch,
    /// Event-based request object.
    #[serde(rename = "xhr")]
    Xhr,
}

impl RequestKind {
    /// Uppercase label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::Fetch => "FETCH",
            RequestKind::Xhr => "XHR",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Fetch => f.write_str("fetch"),
            RequestKind::Xhr => f.write_str("xhr"),
        }
    }
}

/// One settled network call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub id: String,
    /// Same instant as `start_time`.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub request_query: BTreeMap<String, String>,
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<serde_json::Value>,
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// `end_time - start_time`, milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetworkRecord {
    /// Status in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }

    /// Status present and outside `[200, 300)`, including the no-response status 0.
    pub fn is_failure(&self) -> bool {
        self.status.is_some_and(|s| !(200..300).contains(&s))
    }
}

/// Outcome bucket used to query network records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Success,
    Failure,
}

impl StatusFilter {
    /// Whether `record` belongs to this bucket. Records without a status
    /// belong only to `All`.
    pub fn matches(&self, record: &NetworkRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Success => record.is_success(),
            StatusFilter::Failure => record.is_failure(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "success" => Ok(StatusFilter::Success),
            "failure" => Ok(StatusFilter::Failure),
            other => Err(ProtocolError::UnknownFilter(other.to_string())),
        }
    }
}
