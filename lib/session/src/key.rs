//! Session key scheme.
//!
//! One participant may hold several independent conversations at once: one
//! per standup they are answering, one setup wizard, and one pending
//! timezone selection. Each is addressed and expires on its own.

use huddle_core::{ParticipantId, StandupId};
use std::fmt;

/// Address of one in-flight conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Answering a specific standup.
    Report {
        participant: ParticipantId,
        standup: StandupId,
    },
    /// Running the team-setup wizard.
    SetupWizard { participant: ParticipantId },
    /// Waiting for a timezone choice.
    PendingTimezone { participant: ParticipantId },
}

impl SessionKey {
    #[must_use]
    pub fn report(participant: ParticipantId, standup: StandupId) -> Self {
        Self::Report {
            participant,
            standup,
        }
    }

    #[must_use]
    pub fn setup(participant: ParticipantId) -> Self {
        Self::SetupWizard { participant }
    }

    #[must_use]
    pub fn timezone(participant: ParticipantId) -> Self {
        Self::PendingTimezone { participant }
    }

    /// Flat key used by the backing store. Only `[A-Za-z0-9._-]` appear for
    /// platform identities made of digits.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Report {
                participant,
                standup,
            } => format!("report.{participant}.{}", standup.get()),
            Self::SetupWizard { participant } => format!("setup.{participant}"),
            Self::PendingTimezone { participant } => format!("timezone.{participant}"),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
