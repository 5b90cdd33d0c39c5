//! Error types for the session store.

use std::fmt;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No live session under this key (never saved, deleted, or expired).
    NotFound { key: String },
    /// The stored record could not be encoded or decoded.
    Serialization { message: String },
    /// Could not reach the backing store.
    ConnectionFailed { message: String },
    /// The backing store rejected the operation.
    StorageFailed { message: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { key } => write!(f, "session not found: {key}"),
            Self::Serialization { message } => {
                write!(f, "session serialization failed: {message}")
            }
            Self::ConnectionFailed { message } => {
                write!(f, "session store connection failed: {message}")
            }
            Self::StorageFailed { message } => write!(f, "session storage failed: {message}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Returns true if the session is missing or expired.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = SessionError::NotFound {
            key: "report.u1.4".to_string(),
        };
        assert!(err.to_string().contains("report.u1.4"));
        assert!(err.is_not_found());
    }

    #[test]
    fn storage_failed_is_not_not_found() {
        let err = SessionError::StorageFailed {
            message: "timeout".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("timeout"));
    }
}
