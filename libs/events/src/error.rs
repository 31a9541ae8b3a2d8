//! Error types for feed parsing.

use thiserror::Error;

/// Errors that can occur when parsing the upstream feed.
#[derive(Debug, Error, Clone)]
pub enum EventError {
    /// The feed line was blank.
    #[error("empty feed line")]
    Empty,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}
