//! Error types for status filename decoding.

use thiserror::Error;

/// Errors that can occur when decoding a status filename.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The filename is empty.
    #[error("status filename cannot be empty")]
    Empty,

    /// The filename does not have exactly three space-separated components.
    #[error("status filename has {actual} components, expected 3")]
    WrongComponentCount { actual: usize },

    /// A `%` escape is truncated or not followed by two hex digits.
    #[error("invalid escape sequence at byte {offset}")]
    InvalidEscape { offset: usize },

    /// The unescaped component is not valid UTF-8.
    #[error("component is not valid UTF-8 after unescaping")]
    InvalidUtf8,
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if the filename was structurally wrong rather than
    /// badly escaped.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, IdError::Empty | IdError::WrongComponentCount { .. })
    }
}
