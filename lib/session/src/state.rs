//! Session wire record.

use huddle_core::{ChannelId, GuildId, ParticipantId, StandupId};
use serde::{Deserialize, Serialize};

/// Header collected in the first step of the setup wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupDraft {
    pub name: String,
    pub report_channel: Option<ChannelId>,
    /// Raw member mentions as typed by the manager.
    pub members_raw: String,
    /// Already validated and normalized `HH:MM`.
    pub trigger_time: String,
}

/// State of one in-flight conversation.
///
/// `step` always equals `answers.len()`: the index of the next answer expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub participant: ParticipantId,
    #[serde(default)]
    pub guild: Option<GuildId>,
    #[serde(default)]
    pub standup: Option<StandupId>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub step: usize,
    /// Present only for setup wizard sessions; `answers` then holds questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<SetupDraft>,
}

impl SessionState {
    /// A fresh report conversation for a standup.
    #[must_use]
    pub fn report(participant: ParticipantId, guild: Option<GuildId>, standup: StandupId) -> Self {
        Self {
            participant,
            guild,
            standup: Some(standup),
            answers: Vec::new(),
            step: 0,
            setup: None,
        }
    }

    /// A fresh setup wizard conversation.
    #[must_use]
    pub fn setup(participant: ParticipantId, guild: GuildId, draft: SetupDraft) -> Self {
        Self {
            participant,
            guild: Some(guild),
            standup: None,
            answers: Vec::new(),
            step: 0,
            setup: Some(draft),
        }
    }

    /// A pending timezone choice, optionally resuming a standup afterwards.
    #[must_use]
    pub fn pending_timezone(
        participant: ParticipantId,
        guild: Option<GuildId>,
        standup: Option<StandupId>,
    ) -> Self {
        Self {
            participant,
            guild,
            standup,
            answers: Vec::new(),
            step: 0,
            setup: None,
        }
    }

    /// Appends an answer and advances the step.
    pub fn push_answer(&mut self, answer: impl Into<String>) {
        self.answers.push(answer.into());
        self.step = self.answers.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_answer_advances_step() {
        let mut state = SessionState::report(ParticipantId::new("u"), None, StandupId::new(3));
        assert_eq!(state.step, 0);
        state.push_answer("shipped it");
        state.push_answer("more shipping");
        assert_eq!(state.step, 2);
        assert_eq!(state.answers, vec!["shipped it", "more shipping"]);
    }

    #[test]
    fn wire_format_fields() {
        let state = SessionState::report(
            ParticipantId::new("u"),
            Some(GuildId::new("g")),
            StandupId::new(3),
        );
        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["participant"], "u");
        assert_eq!(json["guild"], "g");
        assert_eq!(json["standup"], 3);
        assert_eq!(json["step"], 0);
        assert!(json.get("setup").is_none());
    }

    #[test]
    fn tolerates_minimal_record() {
        let state: SessionState =
            serde_json::from_str(r#"{"participant":"u"}"#).expect("deserialize");
        assert_eq!(state.standup, None);
        assert!(state.answers.is_empty());
    }
}
