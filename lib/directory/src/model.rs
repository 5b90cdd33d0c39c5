//! Directory data model: standups, participant profiles, and history records.

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use huddle_core::{ChannelId, GuildId, HistoryId, ParticipantId, StandupId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Answer list recorded when a participant skips a day.
pub const SKIPPED_SENTINEL: &str = "Skipped / OOO";

/// Wall-clock time of day at which a standup fires, evaluated in each
/// participant's own timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerTime {
    hour: u8,
    minute: u8,
}

impl TriggerTime {
    /// Creates a trigger time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTriggerTime` if the hour is above 23 or the minute above 59.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTriggerTime {
                value: format!("{hour}:{minute}"),
            });
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Returns true if the given wall-clock hour and minute are exactly this time.
    #[must_use]
    pub fn matches(&self, hour: u32, minute: u32) -> bool {
        u32::from(self.hour) == hour && u32::from(self.minute) == minute
    }
}

impl Default for TriggerTime {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TriggerTime {
    type Err = ValidationError;

    /// Accepts `H:M` with one or two digits per part and normalizes to `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTriggerTime {
            value: s.to_string(),
        };

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.trim().parse().map_err(|_| invalid())?;
        let minute: u8 = minute.trim().parse().map_err(|_| invalid())?;

        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TriggerTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TriggerTime> for String {
    fn from(value: TriggerTime) -> Self {
        value.to_string()
    }
}

/// The weekdays on which a standup is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActiveDays(u8);

/// All weekdays in display order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn day_bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

/// Full English name of a weekday.
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl ActiveDays {
    /// Monday through Friday.
    pub const BUSINESS: Self = Self(0b0001_1111);
    /// Every day of the week.
    pub const ALL: Self = Self(0b0111_1111);

    /// Builds a selection from weekdays.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveDays` if the selection is empty.
    pub fn from_weekdays(days: impl IntoIterator<Item = Weekday>) -> Result<Self, ValidationError> {
        let mask = days.into_iter().fold(0u8, |acc, day| acc | day_bit(day));
        if mask == 0 {
            return Err(ValidationError::NoActiveDays);
        }
        Ok(Self(mask))
    }

    /// Parses a list of weekday names such as `"Monday,Wednesday"`.
    ///
    /// An empty list yields the business-day default.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWeekday` for an unrecognized name.
    pub fn parse_list(list: &str) -> Result<Self, ValidationError> {
        let names: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            return Ok(Self::default());
        }

        let days = names
            .into_iter()
            .map(|name| {
                name.parse::<Weekday>()
                    .map_err(|_| ValidationError::InvalidWeekday {
                        value: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_weekdays(days)
    }

    #[must_use]
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & day_bit(day) != 0
    }

    /// Iterates the selected weekdays, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(|day| self.contains(*day))
    }

    /// Renders the selection as a comma-separated list without spaces.
    #[must_use]
    pub fn to_list(&self) -> String {
        self.iter().map(weekday_name).collect::<Vec<_>>().join(",")
    }
}

impl Default for ActiveDays {
    fn default() -> Self {
        Self::BUSINESS
    }
}

impl fmt::Display for ActiveDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(weekday_name).collect();
        f.write_str(&names.join(", "))
    }
}

impl TryFrom<String> for ActiveDays {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_list(&value)
    }
}

impl From<ActiveDays> for String {
    fn from(value: ActiveDays) -> Self {
        value.to_list()
    }
}

/// A recurring status-report definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standup {
    pub id: StandupId,
    pub guild_id: GuildId,
    pub name: String,
    pub manager_id: ParticipantId,
    /// Where reports are published. `None` means publication is skipped.
    pub report_channel: Option<ChannelId>,
    /// Ordered, never empty.
    pub questions: Vec<String>,
    pub trigger_time: TriggerTime,
    pub active_days: ActiveDays,
    pub created_at: DateTime<Utc>,
}

impl Standup {
    /// Returns true if the participant is this standup's manager.
    #[must_use]
    pub fn is_managed_by(&self, participant: &ParticipantId) -> bool {
        &self.manager_id == participant
    }

    /// Returns the question label for an answer position.
    ///
    /// Answers beyond the current question list (e.g. after a question was
    /// removed) are labelled "Update".
    #[must_use]
    pub fn label_for(&self, index: usize) -> &str {
        self.questions.get(index).map_or("Update", String::as_str)
    }

    /// Appends a question.
    ///
    /// # Errors
    ///
    /// Returns `NoQuestions` if the text is empty.
    pub fn push_question(&mut self, text: &str) -> Result<(), ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::NoQuestions);
        }
        self.questions.push(text.to_string());
        Ok(())
    }

    /// Replaces the question at `index`, or removes it when `text` is empty.
    ///
    /// # Errors
    ///
    /// Returns `QuestionOutOfRange` for a bad index, or `LastQuestion` when the
    /// removal would leave the list empty.
    pub fn edit_question(&mut self, index: usize, text: &str) -> Result<(), ValidationError> {
        let len = self.questions.len();
        if index >= len {
            return Err(ValidationError::QuestionOutOfRange { index, len });
        }

        let text = text.trim();
        if text.is_empty() {
            if len == 1 {
                return Err(ValidationError::LastQuestion);
            }
            self.questions.remove(index);
        } else {
            self.questions[index] = text.to_string();
        }
        Ok(())
    }
}

/// Fields for a standup that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStandup {
    pub guild_id: GuildId,
    pub name: String,
    pub manager_id: ParticipantId,
    pub report_channel: Option<ChannelId>,
    pub questions: Vec<String>,
    pub trigger_time: TriggerTime,
    pub active_days: ActiveDays,
    /// Participants attached at creation. Their profiles are created on
    /// demand and reactivated if archived.
    pub members: Vec<ParticipantId>,
}

impl NewStandup {
    /// Trims the name and questions, drops blank questions and duplicate
    /// members, then checks the invariants.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` or `NoQuestions`.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        self.questions = self
            .questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        if self.questions.is_empty() {
            return Err(ValidationError::NoQuestions);
        }

        let mut seen = std::collections::HashSet::new();
        self.members.retain(|m| seen.insert(m.clone()));

        Ok(self)
    }
}

/// Lifecycle of a participant profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileLifecycle {
    Active,
    /// The participant asked for their data to be removed. Profile rows are
    /// kept so that history stays attributable.
    Archived,
}

/// A participant profile, uniquely keyed by platform identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// IANA zone name. `None` until the participant picks one or inherits one.
    pub timezone: Option<String>,
    pub lifecycle: ProfileLifecycle,
}

impl Participant {
    /// A fresh, active profile with no timezone.
    #[must_use]
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            timezone: None,
            lifecycle: ProfileLifecycle::Active,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle == ProfileLifecycle::Active
    }

    /// Moves an archived profile back to active. Returns true if it changed.
    pub fn reactivate(&mut self) -> bool {
        let changed = self.lifecycle == ProfileLifecycle::Archived;
        self.lifecycle = ProfileLifecycle::Active;
        changed
    }

    /// Archives the profile.
    pub fn archive(&mut self) {
        self.lifecycle = ProfileLifecycle::Archived;
    }

    /// The configured zone, ignoring blank values.
    #[must_use]
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref().filter(|tz| !tz.trim().is_empty())
    }
}

/// A standup with its current participant profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandupRoster {
    pub standup: Standup,
    pub participants: Vec<Participant>,
}

/// Filter for standup lookups within a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandupQuery {
    pub guild_id: GuildId,
    /// Only standups managed by this participant.
    pub managed_by: Option<ParticipantId>,
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    pub limit: usize,
}

impl StandupQuery {
    /// Maximum number of results a lookup may return.
    pub const MAX_RESULTS: usize = 25;

    /// Every standup in the guild, up to the result cap.
    #[must_use]
    pub fn in_guild(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            managed_by: None,
            name_contains: None,
            limit: Self::MAX_RESULTS,
        }
    }

    #[must_use]
    pub fn managed_by(mut self, manager: ParticipantId) -> Self {
        self.managed_by = Some(manager);
        self
    }

    #[must_use]
    pub fn name_contains(mut self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        self.name_contains = (!fragment.trim().is_empty()).then(|| fragment.trim().to_string());
        self
    }

    /// Effective limit, never above the cap.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.min(Self::MAX_RESULTS)
    }

    /// Returns true if the standup satisfies every filter.
    #[must_use]
    pub fn matches(&self, standup: &Standup) -> bool {
        if standup.guild_id != self.guild_id {
            return false;
        }
        if let Some(manager) = &self.managed_by
            && &standup.manager_id != manager
        {
            return false;
        }
        if let Some(fragment) = &self.name_contains {
            return standup
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase());
        }
        true
    }
}

/// How a day's report ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOutcome {
    Submitted,
    Skipped,
}

/// Durable evidence that a participant completed or skipped a standup on a
/// local calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub participant: ParticipantId,
    pub standup: StandupId,
    /// Calendar date in the participant's zone at submission time.
    pub date: NaiveDate,
    pub answers: Vec<String>,
    pub outcome: HistoryOutcome,
    pub created_at: DateTime<Utc>,
}

/// A history record that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryRecord {
    pub participant: ParticipantId,
    pub standup: StandupId,
    pub date: NaiveDate,
    pub answers: Vec<String>,
    pub outcome: HistoryOutcome,
}

impl NewHistoryRecord {
    /// A completed report.
    #[must_use]
    pub fn submitted(
        participant: ParticipantId,
        standup: StandupId,
        date: NaiveDate,
        answers: Vec<String>,
    ) -> Self {
        Self {
            participant,
            standup,
            date,
            answers,
            outcome: HistoryOutcome::Submitted,
        }
    }

    /// A skipped day, carrying the sentinel answer.
    #[must_use]
    pub fn skipped(participant: ParticipantId, standup: StandupId, date: NaiveDate) -> Self {
        Self {
            participant,
            standup,
            date,
            answers: vec![SKIPPED_SENTINEL.to_string()],
            outcome: HistoryOutcome::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_standup(questions: &[&str]) -> Standup {
        Standup {
            id: StandupId::new(1),
            guild_id: GuildId::new("g"),
            name: "Backend".to_string(),
            manager_id: ParticipantId::new("m"),
            report_channel: Some(ChannelId::new("c")),
            questions: questions.iter().map(|q| (*q).to_string()).collect(),
            trigger_time: TriggerTime::default(),
            active_days: ActiveDays::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn trigger_time_normalizes() {
        let t: TriggerTime = "9:5".parse().expect("valid");
        assert_eq!(t.to_string(), "09:05");
        let t: TriggerTime = " 23:59 ".parse().expect("valid");
        assert_eq!(t.to_string(), "23:59");
    }

    #[test]
    fn trigger_time_rejects_out_of_range() {
        for bad in ["24:00", "12:60", "noon", "12", "-1:30", ""] {
            assert!(bad.parse::<TriggerTime>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn trigger_time_matches_exactly() {
        let t = TriggerTime::new(9, 0).expect("valid");
        assert!(t.matches(9, 0));
        assert!(!t.matches(9, 1));
        assert!(!t.matches(8, 59));
    }

    #[test]
    fn trigger_time_serde_as_string() {
        let t = TriggerTime::new(7, 30).expect("valid");
        let json = serde_json::to_string(&t).expect("serialize");
        assert_eq!(json, "\"07:30\"");
        let back: TriggerTime = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, t);
    }

    #[test]
    fn active_days_default_is_business_week() {
        let days = ActiveDays::default();
        assert!(days.contains(Weekday::Mon));
        assert!(days.contains(Weekday::Fri));
        assert!(!days.contains(Weekday::Sat));
        assert!(!days.contains(Weekday::Sun));
        assert_eq!(days.to_string(), "Monday, Tuesday, Wednesday, Thursday, Friday");
    }

    #[test]
    fn active_days_parse_list() {
        let days = ActiveDays::parse_list("Saturday, Monday").expect("valid");
        assert_eq!(days.to_list(), "Monday,Saturday");
        assert_eq!(ActiveDays::parse_list("").expect("valid"), ActiveDays::BUSINESS);
        assert!(ActiveDays::parse_list("Funday").is_err());
    }

    #[test]
    fn active_days_rejects_empty_selection() {
        assert_eq!(
            ActiveDays::from_weekdays(Vec::new()),
            Err(ValidationError::NoActiveDays)
        );
    }

    #[test]
    fn edit_question_replaces_and_removes() {
        let mut standup = sample_standup(&["a", "b", "c"]);
        standup.edit_question(1, " B ").expect("replace");
        assert_eq!(standup.questions, vec!["a", "B", "c"]);
        standup.edit_question(0, "  ").expect("remove");
        assert_eq!(standup.questions, vec!["B", "c"]);
    }

    #[test]
    fn edit_question_keeps_last_question() {
        let mut standup = sample_standup(&["only"]);
        assert_eq!(standup.edit_question(0, ""), Err(ValidationError::LastQuestion));
        assert_eq!(standup.questions, vec!["only"]);
    }

    #[test]
    fn edit_question_out_of_range() {
        let mut standup = sample_standup(&["a"]);
        assert!(matches!(
            standup.edit_question(5, "x"),
            Err(ValidationError::QuestionOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn label_for_falls_back_to_update() {
        let standup = sample_standup(&["Yesterday?", "Today?"]);
        assert_eq!(standup.label_for(1), "Today?");
        assert_eq!(standup.label_for(2), "Update");
    }

    #[test]
    fn new_standup_normalization() {
        let new = NewStandup {
            guild_id: GuildId::new("g"),
            name: "  Team  ".to_string(),
            manager_id: ParticipantId::new("m"),
            report_channel: None,
            questions: vec![" q1 ".to_string(), "".to_string()],
            trigger_time: TriggerTime::default(),
            active_days: ActiveDays::default(),
            members: vec![ParticipantId::new("a"), ParticipantId::new("a")],
        };
        let new = new.normalized().expect("valid");
        assert_eq!(new.name, "Team");
        assert_eq!(new.questions, vec!["q1"]);
        assert_eq!(new.members.len(), 1);
    }

    #[test]
    fn new_standup_requires_name_and_questions() {
        let base = NewStandup {
            guild_id: GuildId::new("g"),
            name: " ".to_string(),
            manager_id: ParticipantId::new("m"),
            report_channel: None,
            questions: vec!["q".to_string()],
            trigger_time: TriggerTime::default(),
            active_days: ActiveDays::default(),
            members: Vec::new(),
        };
        assert_eq!(base.clone().normalized(), Err(ValidationError::EmptyName));

        let no_questions = NewStandup {
            name: "Team".to_string(),
            questions: vec!["   ".to_string()],
            ..base
        };
        assert_eq!(no_questions.normalized(), Err(ValidationError::NoQuestions));
    }

    #[test]
    fn profile_lifecycle_transitions() {
        let mut p = Participant::new(ParticipantId::new("u"));
        assert!(p.is_active());
        assert!(!p.reactivate());
        p.archive();
        assert!(!p.is_active());
        assert!(p.reactivate());
        assert!(p.is_active());
    }

    #[test]
    fn blank_timezone_is_unset() {
        let mut p = Participant::new(ParticipantId::new("u"));
        p.timezone = Some("  ".to_string());
        assert_eq!(p.timezone(), None);
        p.timezone = Some("Asia/Kolkata".to_string());
        assert_eq!(p.timezone(), Some("Asia/Kolkata"));
    }

    #[test]
    fn query_matching() {
        let standup = sample_standup(&["q"]);
        let query = StandupQuery::in_guild(GuildId::new("g")).name_contains("END");
        assert!(query.matches(&standup));

        let other_manager = query.clone().managed_by(ParticipantId::new("x"));
        assert!(!other_manager.matches(&standup));

        let other_guild = StandupQuery::in_guild(GuildId::new("h"));
        assert!(!other_guild.matches(&standup));
    }

    #[test]
    fn skipped_record_carries_sentinel() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date");
        let record = NewHistoryRecord::skipped(ParticipantId::new("u"), StandupId::new(1), date);
        assert_eq!(record.answers, vec![SKIPPED_SENTINEL]);
        assert_eq!(record.outcome, HistoryOutcome::Skipped);
    }
}
