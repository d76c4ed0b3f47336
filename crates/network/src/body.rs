//! Response body capture.

use devtap_protocol::constants::JSON_CONTENT_TYPE;
use serde_json::Value;

/// Whether `content_type` declares a structured (JSON) body: either
/// `application/json` or any `+json` media type.
pub fn is_structured(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains(JSON_CONTENT_TYPE) {
        return true;
    }
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().ends_with("+json"))
}

/// Captures a body for the record: structured value for structured content
/// types, raw text otherwise. A structured body that fails to decode is
/// captured as `null`.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Value {
    if !is_structured(content_type) {
        return Value::String(String::from_utf8_lossy(body).into_owned());
    }
    match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "JSON parse error in response body");
            Value::Null
        }
    }
}
