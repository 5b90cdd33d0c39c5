//! Storage contracts for the directory and the history ledger.

use crate::error::DirectoryError;
use crate::model::{
    HistoryRecord, NewHistoryRecord, NewStandup, Participant, Standup, StandupQuery,
    StandupRoster,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use huddle_core::{GuildId, ParticipantId, StandupId};

/// Persistent store for standups, participant profiles, and memberships.
///
/// Granting membership (at creation or via `add_member`) creates the
/// participant profile on demand and reactivates it if archived.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Validates and stores a standup together with its initial members.
    ///
    /// Nothing is written if validation fails.
    async fn create_standup(&self, new: NewStandup) -> Result<Standup, DirectoryError>;

    /// Gets a standup by id.
    async fn get_standup(&self, id: StandupId) -> Result<Standup, DirectoryError>;

    /// Gets a standup by its exact name within a guild.
    async fn find_standup(&self, guild: &GuildId, name: &str) -> Result<Standup, DirectoryError>;

    /// Replaces a standup's mutable fields.
    async fn update_standup(&self, standup: &Standup) -> Result<(), DirectoryError>;

    /// Clears the standup's memberships and deletes it.
    async fn delete_standup(&self, id: StandupId) -> Result<(), DirectoryError>;

    /// Filtered lookup, ordered by name and capped at `StandupQuery::MAX_RESULTS`.
    async fn search_standups(&self, query: &StandupQuery) -> Result<Vec<Standup>, DirectoryError>;

    /// Every standup with its participants (full scan for the scheduler).
    async fn list_rosters(&self) -> Result<Vec<StandupRoster>, DirectoryError>;

    /// Standups the participant belongs to, ordered by id.
    async fn standups_for(&self, participant: &ParticipantId)
    -> Result<Vec<Standup>, DirectoryError>;

    /// Participant profiles attached to a standup.
    async fn members(&self, standup: StandupId) -> Result<Vec<Participant>, DirectoryError>;

    /// Gets a participant profile if one exists.
    async fn get_participant(
        &self,
        id: &ParticipantId,
    ) -> Result<Option<Participant>, DirectoryError>;

    /// Gets a participant profile, creating an active one if missing.
    async fn ensure_participant(&self, id: &ParticipantId) -> Result<Participant, DirectoryError>;

    /// Persists a participant's timezone and lifecycle.
    async fn save_participant(&self, participant: &Participant) -> Result<(), DirectoryError>;

    /// Attaches a participant. Returns false if already a member.
    async fn add_member(
        &self,
        standup: StandupId,
        participant: &ParticipantId,
    ) -> Result<bool, DirectoryError>;

    /// Detaches a participant. Returns false if not a member.
    async fn remove_member(
        &self,
        standup: StandupId,
        participant: &ParticipantId,
    ) -> Result<bool, DirectoryError>;

    /// Detaches a participant from every standup. Returns the count removed.
    async fn clear_memberships(&self, participant: &ParticipantId) -> Result<u64, DirectoryError>;
}

/// Append-only record of completed and skipped daily submissions.
#[async_trait]
pub trait HistoryLedger: Send + Sync {
    /// Writes a record. Records are immutable once written.
    async fn create(&self, record: NewHistoryRecord) -> Result<HistoryRecord, DirectoryError>;

    /// Returns true if any record exists for the participant, standup and date.
    async fn exists(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
        date: NaiveDate,
    ) -> Result<bool, DirectoryError>;

    /// Records on or after `since`, newest first.
    async fn query(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
        since: NaiveDate,
    ) -> Result<Vec<HistoryRecord>, DirectoryError>;
}
