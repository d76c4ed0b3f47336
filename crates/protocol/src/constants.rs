/// Method recorded when a promise-style call does not specify one.
pub const DEFAULT_METHOD: &str = "GET";

/// Status text recorded when a call settles without any response.
pub const NO_RESPONSE_STATUS_TEXT: &str = "No Response (Network Error)";

/// Error description used when the transport gives no better one.
pub const NETWORK_ERROR: &str = "Network Error";

/// Status recorded for calls that never produced a response.
pub const NO_RESPONSE_STATUS: u16 = 0;

/// Content type marking a structured (JSON) body.
pub const JSON_CONTENT_TYPE: &str = "application/json";
