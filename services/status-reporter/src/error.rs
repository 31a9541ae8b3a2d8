//! Error types for the status reporter.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Status reporter errors.
#[derive(Debug, Error)]
pub enum StatusError {
    /// A filesystem operation on the status directory failed.
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// An input channel closed while the reporter was running.
    #[error("{0} channel closed unexpectedly")]
    InputClosed(&'static str),
}

impl StatusError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StatusError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error means the target file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StatusError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// Returns true if the reporter cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StatusError::InputClosed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = StatusError::io(
            "remove",
            "/tmp/policy/x",
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert!(!err.is_fatal());

        let err = StatusError::io(
            "remove",
            "/tmp/policy/x",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_display_includes_path() {
        let err = StatusError::io(
            "create",
            "/run/status/policy/k8s a b",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("failed to create /run/status/policy/k8s a b"));
    }

    #[test]
    fn test_input_closed_is_fatal() {
        let err = StatusError::InputClosed("in-sync");
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "in-sync channel closed unexpectedly");
    }
}
