//! Error types for the scheduler crate.

use huddle_core::{ParticipantId, StandupId};
use huddle_directory::DirectoryError;
use std::fmt;

/// Errors from a scan or from firing one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The participant's configured zone is not a known IANA name.
    InvalidTimezone {
        participant: ParticipantId,
        timezone: String,
    },
    /// Loading rosters or checking the ledger failed.
    Directory(DirectoryError),
    /// The reminder could not be delivered.
    NotifyFailed {
        participant: ParticipantId,
        reason: String,
    },
    /// The report flow could not be started.
    LaunchFailed {
        participant: ParticipantId,
        standup: StandupId,
        reason: String,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimezone {
                participant,
                timezone,
            } => write!(f, "invalid timezone '{timezone}' for participant {participant}"),
            Self::Directory(e) => write!(f, "directory lookup failed: {e}"),
            Self::NotifyFailed {
                participant,
                reason,
            } => write!(f, "failed to remind {participant}: {reason}"),
            Self::LaunchFailed {
                participant,
                standup,
                reason,
            } => write!(f, "failed to start {standup} for {participant}: {reason}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<DirectoryError> for ScheduleError {
    fn from(e: DirectoryError) -> Self {
        Self::Directory(e)
    }
}
