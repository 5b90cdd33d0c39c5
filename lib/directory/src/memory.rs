//! In-memory directory and ledger.
//!
//! Used when no database is configured and throughout the test suites.

use crate::error::DirectoryError;
use crate::model::{
    HistoryRecord, NewHistoryRecord, NewStandup, Participant, Standup, StandupQuery,
    StandupRoster,
};
use crate::store::{DirectoryStore, HistoryLedger};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use huddle_core::{GuildId, HistoryId, ParticipantId, StandupId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_standup: i64,
    next_history: i64,
    standups: BTreeMap<StandupId, Standup>,
    participants: HashMap<ParticipantId, Participant>,
    memberships: BTreeSet<(StandupId, ParticipantId)>,
    history: Vec<HistoryRecord>,
}

impl Inner {
    fn grant(&mut self, standup: StandupId, participant: &ParticipantId) -> bool {
        self.participants
            .entry(participant.clone())
            .or_insert_with(|| Participant::new(participant.clone()))
            .reactivate();
        self.memberships.insert((standup, participant.clone()))
    }

    fn standup(&self, id: StandupId) -> Result<&Standup, DirectoryError> {
        self.standups
            .get(&id)
            .ok_or(DirectoryError::StandupNotFound { id })
    }
}

/// Directory store and history ledger held in process memory.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every history record, in write order.
    pub async fn history_records(&self) -> Vec<HistoryRecord> {
        self.inner.read().await.history.clone()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn create_standup(&self, new: NewStandup) -> Result<Standup, DirectoryError> {
        let new = new.normalized()?;
        let mut inner = self.inner.write().await;

        if inner
            .standups
            .values()
            .any(|s| s.guild_id == new.guild_id && s.name == new.name)
        {
            return Err(DirectoryError::DuplicateName {
                guild: new.guild_id,
                name: new.name,
            });
        }

        inner.next_standup += 1;
        let standup = Standup {
            id: StandupId::new(inner.next_standup),
            guild_id: new.guild_id,
            name: new.name,
            manager_id: new.manager_id,
            report_channel: new.report_channel,
            questions: new.questions,
            trigger_time: new.trigger_time,
            active_days: new.active_days,
            created_at: Utc::now(),
        };
        inner.standups.insert(standup.id, standup.clone());

        for member in &new.members {
            inner.grant(standup.id, member);
        }

        Ok(standup)
    }

    async fn get_standup(&self, id: StandupId) -> Result<Standup, DirectoryError> {
        self.inner.read().await.standup(id).cloned()
    }

    async fn find_standup(&self, guild: &GuildId, name: &str) -> Result<Standup, DirectoryError> {
        self.inner
            .read()
            .await
            .standups
            .values()
            .find(|s| &s.guild_id == guild && s.name == name)
            .cloned()
            .ok_or_else(|| DirectoryError::StandupNameNotFound {
                guild: guild.clone(),
                name: name.to_string(),
            })
    }

    async fn update_standup(&self, standup: &Standup) -> Result<(), DirectoryError> {
        if standup.questions.is_empty() {
            return Err(crate::error::ValidationError::NoQuestions.into());
        }
        let mut inner = self.inner.write().await;
        let stored = inner
            .standups
            .get_mut(&standup.id)
            .ok_or(DirectoryError::StandupNotFound { id: standup.id })?;
        *stored = standup.clone();
        Ok(())
    }

    async fn delete_standup(&self, id: StandupId) -> Result<(), DirectoryError> {
        let mut inner = self.inner.write().await;
        inner.memberships.retain(|(s, _)| *s != id);
        inner
            .standups
            .remove(&id)
            .map(|_| ())
            .ok_or(DirectoryError::StandupNotFound { id })
    }

    async fn search_standups(&self, query: &StandupQuery) -> Result<Vec<Standup>, DirectoryError> {
        let inner = self.inner.read().await;
        let mut found: Vec<Standup> = inner
            .standups
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(query.effective_limit());
        Ok(found)
    }

    async fn list_rosters(&self) -> Result<Vec<StandupRoster>, DirectoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .standups
            .values()
            .map(|standup| StandupRoster {
                standup: standup.clone(),
                participants: inner
                    .memberships
                    .iter()
                    .filter(|(s, _)| *s == standup.id)
                    .filter_map(|(_, p)| inner.participants.get(p).cloned())
                    .collect(),
            })
            .collect())
    }

    async fn standups_for(
        &self,
        participant: &ParticipantId,
    ) -> Result<Vec<Standup>, DirectoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .memberships
            .iter()
            .filter(|(_, p)| p == participant)
            .filter_map(|(s, _)| inner.standups.get(s).cloned())
            .collect())
    }

    async fn members(&self, standup: StandupId) -> Result<Vec<Participant>, DirectoryError> {
        let inner = self.inner.read().await;
        inner.standup(standup)?;
        Ok(inner
            .memberships
            .iter()
            .filter(|(s, _)| *s == standup)
            .filter_map(|(_, p)| inner.participants.get(p).cloned())
            .collect())
    }

    async fn get_participant(
        &self,
        id: &ParticipantId,
    ) -> Result<Option<Participant>, DirectoryError> {
        Ok(self.inner.read().await.participants.get(id).cloned())
    }

    async fn ensure_participant(&self, id: &ParticipantId) -> Result<Participant, DirectoryError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .participants
            .entry(id.clone())
            .or_insert_with(|| Participant::new(id.clone()))
            .clone())
    }

    async fn save_participant(&self, participant: &Participant) -> Result<(), DirectoryError> {
        self.inner
            .write()
            .await
            .participants
            .insert(participant.id.clone(), participant.clone());
        Ok(())
    }

    async fn add_member(
        &self,
        standup: StandupId,
        participant: &ParticipantId,
    ) -> Result<bool, DirectoryError> {
        let mut inner = self.inner.write().await;
        inner.standup(standup)?;
        if inner.memberships.contains(&(standup, participant.clone())) {
            return Ok(false);
        }
        Ok(inner.grant(standup, participant))
    }

    async fn remove_member(
        &self,
        standup: StandupId,
        participant: &ParticipantId,
    ) -> Result<bool, DirectoryError> {
        let mut inner = self.inner.write().await;
        inner.standup(standup)?;
        Ok(inner.memberships.remove(&(standup, participant.clone())))
    }

    async fn clear_memberships(&self, participant: &ParticipantId) -> Result<u64, DirectoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.memberships.len();
        inner.memberships.retain(|(_, p)| p != participant);
        Ok((before - inner.memberships.len()) as u64)
    }
}

#[async_trait]
impl HistoryLedger for InMemoryDirectory {
    async fn create(&self, record: NewHistoryRecord) -> Result<HistoryRecord, DirectoryError> {
        let mut inner = self.inner.write().await;
        inner.next_history += 1;
        let record = HistoryRecord {
            id: HistoryId::new(inner.next_history),
            participant: record.participant,
            standup: record.standup,
            date: record.date,
            answers: record.answers,
            outcome: record.outcome,
            created_at: Utc::now(),
        };
        inner.history.push(record.clone());
        Ok(record)
    }

    async fn exists(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
        date: NaiveDate,
    ) -> Result<bool, DirectoryError> {
        Ok(self
            .inner
            .read()
            .await
            .history
            .iter()
            .any(|r| &r.participant == participant && r.standup == standup && r.date == date))
    }

    async fn query(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
        since: NaiveDate,
    ) -> Result<Vec<HistoryRecord>, DirectoryError> {
        let inner = self.inner.read().await;
        let mut records: Vec<HistoryRecord> = inner
            .history
            .iter()
            .filter(|r| &r.participant == participant && r.standup == standup && r.date >= since)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}
