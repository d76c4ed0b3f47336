//! Error types for network calls.

/// Failure of a network call before any response was produced.
///
/// Interceptors record the failure's text and return the same value to the
/// caller, so the type is cheap to clone and comparable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("request aborted")]
    Aborted,

    #[error("request is not open")]
    NotOpened,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else if e.is_builder() {
            NetworkError::InvalidRequest(e.to_string())
        } else {
            NetworkError::Transport(e.to_string())
        }
    }
}
