//! Typed payloads carried by interactive UI elements.
//!
//! Every button, select menu, and form carries one of these values. They are
//! encoded into the platform's opaque custom-id string when a message is
//! rendered, and decoded back exactly once when the interaction arrives, so
//! handlers match on enums rather than parsing identifiers.

use huddle_core::StandupId;
use serde::{Deserialize, Serialize};

/// What a button or select menu does when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "a", rename_all = "snake_case")]
pub enum ComponentAction {
    /// "Fill Standup": restart the report and ask the first question.
    FillReport { standup: StandupId },
    /// "Skip Today".
    SkipReport { standup: StandupId },
    /// "Next: Question N".
    ContinueReport { standup: StandupId, index: usize },
    /// Standup selection menu; the selected value is a standup id.
    SelectStandup,
    /// Setup wizard: ask for question `number` (1-based).
    AddSetupQuestion { number: usize },
    /// Setup wizard: create the standup.
    FinalizeSetup,
    /// Active-day multi-select; values are weekday names.
    EditDays { standup: StandupId },
    /// Open the question dashboard.
    OpenQuestions { standup: StandupId },
    /// Question dashboard select; the value is a question index.
    SelectQuestion { standup: StandupId },
    /// Question dashboard: append a question.
    AddQuestion { standup: StandupId },
    /// Close the edit dashboard.
    FinishEditing { standup: StandupId },
    /// Open the timezone menu, resuming `standup` once a zone is picked.
    SetTimezone { standup: StandupId },
    /// Timezone menu; the value is an IANA zone name.
    SelectTimezone,
}

/// Which form a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "f", rename_all = "snake_case")]
pub enum FormKind {
    /// Setup wizard question `number` (1-based).
    SetupQuestion { number: usize },
    /// Answer to question `index` of a standup.
    ReportAnswer { standup: StandupId, index: usize },
    /// Replace or clear question `index`.
    EditQuestion { standup: StandupId, index: usize },
    /// Append a question.
    AddQuestion { standup: StandupId },
}

/// Serde adapter storing a typed payload as an opaque custom-id string.
pub mod custom_id {
    use serde::de::{DeserializeOwned, Error as _};
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Platform limit on custom-id length.
    pub const MAX_LEN: usize = 100;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        let encoded = serde_json::to_string(value).map_err(S::Error::custom)?;
        if encoded.len() > MAX_LEN {
            return Err(S::Error::custom(format!(
                "custom id exceeds {MAX_LEN} characters"
            )));
        }
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        serde_json::from_str(&raw)
            .map_err(|e| D::Error::custom(format!("unrecognized custom id '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Carrier {
        #[serde(with = "custom_id")]
        custom_id: ComponentAction,
    }

    #[test]
    fn custom_id_is_a_string() {
        let carrier = Carrier {
            custom_id: ComponentAction::ContinueReport {
                standup: StandupId::new(12),
                index: 3,
            },
        };
        let json = serde_json::to_value(&carrier).expect("serialize");
        let raw = json["custom_id"].as_str().expect("string");
        assert!(raw.len() <= custom_id::MAX_LEN);

        let back: Carrier = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, carrier);
    }

    #[test]
    fn foreign_custom_id_is_rejected() {
        let result: Result<Carrier, _> =
            serde_json::from_str(r#"{"custom_id":"open_standup_modal_12"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn longest_payloads_fit() {
        let widest = FormKind::ReportAnswer {
            standup: StandupId::new(i64::MAX),
            index: usize::MAX,
        };
        assert!(serde_json::to_string(&widest).expect("encode").len() <= custom_id::MAX_LEN);
    }
}
