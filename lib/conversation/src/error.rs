//! Error types for the conversation crate.
//!
//! - `GatewayError`: outbound delivery through the messaging gateway failed
//! - `FlowError`: a conversation step could not be completed; each category
//!   renders as an ephemeral message to the participant

use huddle_directory::DirectoryError;
use huddle_session::SessionError;
use std::fmt;

/// Errors from the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never reached the platform.
    SendFailed { message: String },
    /// The platform rejected the request.
    Rejected { status: u16, message: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { message } => write!(f, "gateway send failed: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "gateway rejected request ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Hint shown when a report session has expired.
pub const REPORT_RESTART_HINT: &str = "Please run `/start` to try again.";

/// Hint shown when a setup wizard session has expired.
pub const SETUP_RESTART_HINT: &str = "Please start over with `/create-standup`.";

/// Errors from conversation steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Input was malformed or violates an invariant. Nothing was written.
    Validation { message: String },
    /// A referenced standup or profile does not exist.
    NotFound { message: String },
    /// The conversation's session is missing or expired.
    SessionExpired { restart_hint: &'static str },
    /// The caller may not perform this action. Nothing was written.
    Unauthorized { message: String },
    /// A store or the gateway failed.
    Transient { operation: &'static str, reason: String },
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Wraps a lower-level failure with the operation it interrupted.
    pub fn transient(operation: &'static str, reason: impl fmt::Display) -> Self {
        Self::Transient {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Maps a session lookup failure, treating a missing session as expired.
    pub fn from_session(error: SessionError, restart_hint: &'static str) -> Self {
        if error.is_not_found() {
            Self::SessionExpired { restart_hint }
        } else {
            Self::transient("loading your session", error)
        }
    }

    /// The ephemeral text shown to the participant.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } | Self::NotFound { message } => format!("❌ {message}"),
            Self::SessionExpired { restart_hint } => {
                format!("❌ Session expired. {restart_hint}")
            }
            Self::Unauthorized { message } => format!("⛔ {message}"),
            Self::Transient { operation, .. } => {
                format!("❌ Something went wrong while {operation}. Please try again.")
            }
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message } => write!(f, "validation failed: {message}"),
            Self::NotFound { message } => write!(f, "not found: {message}"),
            Self::SessionExpired { .. } => write!(f, "session expired"),
            Self::Unauthorized { message } => write!(f, "unauthorized: {message}"),
            Self::Transient { operation, reason } => {
                write!(f, "transient failure while {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for FlowError {}

impl From<DirectoryError> for FlowError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::StandupNameNotFound { name, .. } => {
                Self::not_found(format!("Standup named **{name}** not found in this server."))
            }
            DirectoryError::StandupNotFound { .. } => Self::not_found("Standup not found."),
            DirectoryError::ParticipantNotFound { .. } => Self::not_found("No profile found."),
            DirectoryError::DuplicateName { name, .. } => Self::validation(format!(
                "A standup named **{name}** already exists in this server."
            )),
            DirectoryError::Validation(v) => Self::validation(capitalize(&v.to_string())),
            DirectoryError::StorageFailed { .. } => Self::transient("talking to the directory", e),
        }
    }
}

impl From<SessionError> for FlowError {
    fn from(e: SessionError) -> Self {
        Self::from_session(e, REPORT_RESTART_HINT)
    }
}

impl From<GatewayError> for FlowError {
    fn from(e: GatewayError) -> Self {
        Self::transient("sending a message", e)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::GuildId;
    use huddle_directory::ValidationError;

    #[test]
    fn gateway_error_display() {
        let err = GatewayError::Rejected {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn session_not_found_becomes_expired() {
        let err: FlowError = SessionError::NotFound {
            key: "report.1.2".to_string(),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "❌ Session expired. Please run `/start` to try again."
        );
    }

    #[test]
    fn session_storage_failure_is_transient() {
        let err = FlowError::from_session(
            SessionError::StorageFailed {
                message: "down".to_string(),
            },
            SETUP_RESTART_HINT,
        );
        assert!(matches!(err, FlowError::Transient { .. }));
        assert!(!err.user_message().contains("down"));
    }

    #[test]
    fn directory_errors_map_to_categories() {
        let err: FlowError = DirectoryError::StandupNameNotFound {
            guild: GuildId::new("g"),
            name: "Ops".to_string(),
        }
        .into();
        assert!(matches!(err, FlowError::NotFound { .. }));
        assert!(err.user_message().contains("**Ops**"));

        let err: FlowError = DirectoryError::Validation(ValidationError::NoQuestions).into();
        assert_eq!(
            err.user_message(),
            "❌ A standup needs at least one question."
        );
    }

    #[test]
    fn unauthorized_message() {
        let err = FlowError::unauthorized("Only the manager can do that.");
        assert_eq!(err.user_message(), "⛔ Only the manager can do that.");
    }
}
