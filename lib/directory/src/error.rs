//! Error types for the directory crate.
//!
//! - `ValidationError`: a record failed a data-model invariant before any write
//! - `DirectoryError`: errors from Directory Store and History Ledger operations

use huddle_core::{GuildId, ParticipantId, StandupId};
use std::fmt;

/// A data-model invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The standup name is empty after trimming.
    EmptyName,
    /// The standup has no questions.
    NoQuestions,
    /// A trigger time is not a valid `HH:MM` 24-hour value.
    InvalidTriggerTime { value: String },
    /// A weekday name could not be recognized.
    InvalidWeekday { value: String },
    /// An active-day selection was empty.
    NoActiveDays,
    /// A question index is outside the question list.
    QuestionOutOfRange { index: usize, len: usize },
    /// Removing the question would leave the standup without questions.
    LastQuestion,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "standup name must not be empty"),
            Self::NoQuestions => write!(f, "a standup needs at least one question"),
            Self::InvalidTriggerTime { value } => {
                write!(f, "invalid trigger time '{value}': expected HH:MM in 24h format")
            }
            Self::InvalidWeekday { value } => write!(f, "unknown weekday '{value}'"),
            Self::NoActiveDays => write!(f, "at least one active day is required"),
            Self::QuestionOutOfRange { index, len } => {
                write!(f, "question {} does not exist (standup has {len})", index + 1)
            }
            Self::LastQuestion => write!(f, "the last remaining question cannot be deleted"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from directory and ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No standup with this id.
    StandupNotFound { id: StandupId },
    /// No standup with this name in the guild.
    StandupNameNotFound { guild: GuildId, name: String },
    /// A standup with this name already exists in the guild.
    DuplicateName { guild: GuildId, name: String },
    /// No profile for this participant.
    ParticipantNotFound { id: ParticipantId },
    /// The record violates a data-model invariant.
    Validation(ValidationError),
    /// The backing store failed.
    StorageFailed { reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StandupNotFound { id } => write!(f, "standup not found: {id}"),
            Self::StandupNameNotFound { guild, name } => {
                write!(f, "standup '{name}' not found in guild {guild}")
            }
            Self::DuplicateName { guild, name } => {
                write!(f, "standup '{name}' already exists in guild {guild}")
            }
            Self::ParticipantNotFound { id } => write!(f, "participant not found: {id}"),
            Self::Validation(e) => write!(f, "validation failed: {e}"),
            Self::StorageFailed { reason } => write!(f, "directory storage failed: {reason}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<ValidationError> for DirectoryError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        Self::StorageFailed {
            reason: e.to_string(),
        }
    }
}

impl DirectoryError {
    /// Returns true if the error means the record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::StandupNotFound { .. }
                | Self::StandupNameNotFound { .. }
                | Self::ParticipantNotFound { .. }
        )
    }
}
