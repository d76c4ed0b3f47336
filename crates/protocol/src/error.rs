//! Error types for parsing record model values.

/// Errors produced when parsing closed enumerations from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown log level: {0}")]
    UnknownLevel(String),

    #[error("unknown status filter: {0}")]
    UnknownFilter(String),

    #[error("unknown position: {0}")]
    UnknownPosition(String),

    #[error("unknown theme: {0}")]
    UnknownTheme(String),
}
