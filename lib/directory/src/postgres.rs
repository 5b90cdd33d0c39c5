//! PostgreSQL-backed directory and ledger.

use crate::error::{DirectoryError, ValidationError};
use crate::model::{
    ActiveDays, HistoryOutcome, HistoryRecord, NewHistoryRecord, NewStandup, Participant,
    ProfileLifecycle, Standup, StandupQuery, StandupRoster, TriggerTime,
};
use crate::store::{DirectoryStore, HistoryLedger};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use huddle_core::{ChannelId, GuildId, HistoryId, ParticipantId, StandupId};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;

fn decode_error(what: &str, value: &str, reason: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid {what} '{value}': {reason}"),
    )))
}

/// Row type for standup queries.
#[derive(FromRow)]
struct StandupRow {
    id: i64,
    guild_id: String,
    name: String,
    manager_id: String,
    report_channel_id: Option<String>,
    questions: Vec<String>,
    trigger_time: String,
    active_days: String,
    created_at: DateTime<Utc>,
}

impl StandupRow {
    fn try_into_standup(self) -> Result<Standup, sqlx::Error> {
        let trigger_time: TriggerTime = self
            .trigger_time
            .parse()
            .map_err(|e| decode_error("trigger time", &self.trigger_time, e))?;
        let active_days = ActiveDays::parse_list(&self.active_days)
            .map_err(|e| decode_error("active days", &self.active_days, e))?;

        Ok(Standup {
            id: StandupId::new(self.id),
            guild_id: GuildId::new(self.guild_id),
            name: self.name,
            manager_id: ParticipantId::new(self.manager_id),
            report_channel: self
                .report_channel_id
                .filter(|c| !c.is_empty())
                .map(ChannelId::new),
            questions: self.questions,
            trigger_time,
            active_days,
            created_at: self.created_at,
        })
    }
}

/// Pairs each standup with its members. A row that does not decode is
/// logged and left out so the rest of the scan still runs.
fn assemble_rosters(
    standups: Vec<StandupRow>,
    mut by_standup: HashMap<i64, Vec<Participant>>,
) -> Vec<StandupRoster> {
    standups
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            let participants = by_standup.remove(&id).unwrap_or_default();
            match row.try_into_standup() {
                Ok(standup) => Some(StandupRoster {
                    standup,
                    participants,
                }),
                Err(e) => {
                    tracing::warn!(standup = id, error = %e, "Skipping undecodable standup");
                    None
                }
            }
        })
        .collect()
}

/// Row type for participant queries.
#[derive(FromRow)]
struct ParticipantRow {
    id: String,
    timezone: Option<String>,
    archived_at: Option<DateTime<Utc>>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: ParticipantId::new(row.id),
            timezone: row.timezone,
            lifecycle: if row.archived_at.is_some() {
                ProfileLifecycle::Archived
            } else {
                ProfileLifecycle::Active
            },
        }
    }
}

/// Row type for roster membership queries.
#[derive(FromRow)]
struct MemberRow {
    standup_id: i64,
    id: String,
    timezone: Option<String>,
    archived_at: Option<DateTime<Utc>>,
}

/// Row type for history queries.
#[derive(FromRow)]
struct HistoryRow {
    id: i64,
    participant_id: String,
    standup_id: i64,
    date: NaiveDate,
    answers: serde_json::Value,
    skipped: bool,
    created_at: DateTime<Utc>,
}

impl HistoryRow {
    fn try_into_record(self) -> Result<HistoryRecord, sqlx::Error> {
        let answers: Vec<String> = serde_json::from_value(self.answers)
            .map_err(|e| decode_error("history answers", &self.id.to_string(), e))?;

        Ok(HistoryRecord {
            id: HistoryId::new(self.id),
            participant: ParticipantId::new(self.participant_id),
            standup: StandupId::new(self.standup_id),
            date: self.date,
            answers,
            outcome: if self.skipped {
                HistoryOutcome::Skipped
            } else {
                HistoryOutcome::Submitted
            },
            created_at: self.created_at,
        })
    }
}

const STANDUP_COLUMNS: &str = "id, guild_id, name, manager_id, report_channel_id, questions, \
                               trigger_time, active_days, created_at";

/// Directory store and history ledger on PostgreSQL.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Creates a new directory over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Upserts an active profile inside a transaction, clearing any archive marker.
    async fn grant_profile(
        tx: &mut Transaction<'_, Postgres>,
        participant: &ParticipantId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO participants (id)
            VALUES ($1)
            ON CONFLICT (id) DO UPDATE SET archived_at = NULL, updated_at = NOW()
            "#,
        )
        .bind(participant.as_str())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_membership(
        tx: &mut Transaction<'_, Postgres>,
        standup: StandupId,
        participant: &ParticipantId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO standup_participants (standup_id, participant_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(standup.get())
        .bind(participant.as_str())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn standup_exists(&self, id: StandupId) -> Result<(), DirectoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM standups WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|_| ()).ok_or(DirectoryError::StandupNotFound { id })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl DirectoryStore for PgDirectory {
    async fn create_standup(&self, new: NewStandup) -> Result<Standup, DirectoryError> {
        let new = new.normalized()?;
        let mut tx = self.pool.begin().await?;

        let row: StandupRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO standups
                (guild_id, name, manager_id, report_channel_id, questions, trigger_time, active_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STANDUP_COLUMNS}
            "#
        ))
        .bind(new.guild_id.as_str())
        .bind(&new.name)
        .bind(new.manager_id.as_str())
        .bind(new.report_channel.as_ref().map(ChannelId::as_str))
        .bind(&new.questions)
        .bind(new.trigger_time.to_string())
        .bind(new.active_days.to_list())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DirectoryError::DuplicateName {
                    guild: new.guild_id.clone(),
                    name: new.name.clone(),
                }
            } else {
                e.into()
            }
        })?;
        let standup = row.try_into_standup()?;

        for member in &new.members {
            Self::grant_profile(&mut tx, member).await?;
            Self::insert_membership(&mut tx, standup.id, member).await?;
        }

        tx.commit().await?;
        tracing::debug!(
            standup = %standup.id,
            members = new.members.len(),
            "Created standup"
        );
        Ok(standup)
    }

    async fn get_standup(&self, id: StandupId) -> Result<Standup, DirectoryError> {
        let row: Option<StandupRow> = sqlx::query_as(&format!(
            "SELECT {STANDUP_COLUMNS} FROM standups WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(r.try_into_standup()?),
            None => Err(DirectoryError::StandupNotFound { id }),
        }
    }

    async fn find_standup(&self, guild: &GuildId, name: &str) -> Result<Standup, DirectoryError> {
        let row: Option<StandupRow> = sqlx::query_as(&format!(
            "SELECT {STANDUP_COLUMNS} FROM standups WHERE guild_id = $1 AND name = $2"
        ))
        .bind(guild.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(r.try_into_standup()?),
            None => Err(DirectoryError::StandupNameNotFound {
                guild: guild.clone(),
                name: name.to_string(),
            }),
        }
    }

    async fn update_standup(&self, standup: &Standup) -> Result<(), DirectoryError> {
        if standup.questions.is_empty() {
            return Err(ValidationError::NoQuestions.into());
        }

        let result = sqlx::query(
            r#"
            UPDATE standups
            SET name = $2, manager_id = $3, report_channel_id = $4, questions = $5,
                trigger_time = $6, active_days = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(standup.id.get())
        .bind(&standup.name)
        .bind(standup.manager_id.as_str())
        .bind(standup.report_channel.as_ref().map(ChannelId::as_str))
        .bind(&standup.questions)
        .bind(standup.trigger_time.to_string())
        .bind(standup.active_days.to_list())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::StandupNotFound { id: standup.id });
        }
        Ok(())
    }

    async fn delete_standup(&self, id: StandupId) -> Result<(), DirectoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM standup_participants WHERE standup_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM standups WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::StandupNotFound { id });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn search_standups(&self, query: &StandupQuery) -> Result<Vec<Standup>, DirectoryError> {
        let rows: Vec<StandupRow> = sqlx::query_as(&format!(
            r#"
            SELECT {STANDUP_COLUMNS}
            FROM standups
            WHERE guild_id = $1
              AND ($2::TEXT IS NULL OR manager_id = $2)
              AND ($3::TEXT IS NULL OR strpos(lower(name), lower($3)) > 0)
            ORDER BY name
            LIMIT $4
            "#
        ))
        .bind(query.guild_id.as_str())
        .bind(query.managed_by.as_ref().map(ParticipantId::as_str))
        .bind(query.name_contains.as_deref())
        .bind(query.effective_limit() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(StandupRow::try_into_standup)
            .collect::<Result<_, _>>()?)
    }

    async fn list_rosters(&self) -> Result<Vec<StandupRoster>, DirectoryError> {
        let standups: Vec<StandupRow> = sqlx::query_as(&format!(
            "SELECT {STANDUP_COLUMNS} FROM standups ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let members: Vec<MemberRow> = sqlx::query_as(
            r#"
            SELECT sp.standup_id, p.id, p.timezone, p.archived_at
            FROM standup_participants sp
            JOIN participants p ON p.id = sp.participant_id
            ORDER BY sp.standup_id, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_standup: HashMap<i64, Vec<Participant>> = HashMap::new();
        for m in members {
            by_standup
                .entry(m.standup_id)
                .or_default()
                .push(Participant::from(ParticipantRow {
                    id: m.id,
                    timezone: m.timezone,
                    archived_at: m.archived_at,
                }));
        }

        Ok(assemble_rosters(standups, by_standup))
    }

    async fn standups_for(
        &self,
        participant: &ParticipantId,
    ) -> Result<Vec<Standup>, DirectoryError> {
        let rows: Vec<StandupRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.guild_id, s.name, s.manager_id, s.report_channel_id, s.questions,
                   s.trigger_time, s.active_days, s.created_at
            FROM standups s
            JOIN standup_participants sp ON sp.standup_id = s.id
            WHERE sp.participant_id = $1
            ORDER BY s.id
            "#,
        )
        .bind(participant.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(StandupRow::try_into_standup)
            .collect::<Result<_, _>>()?)
    }

    async fn members(&self, standup: StandupId) -> Result<Vec<Participant>, DirectoryError> {
        self.standup_exists(standup).await?;

        let rows: Vec<ParticipantRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.timezone, p.archived_at
            FROM participants p
            JOIN standup_participants sp ON sp.participant_id = p.id
            WHERE sp.standup_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(standup.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Participant::from).collect())
    }

    async fn get_participant(
        &self,
        id: &ParticipantId,
    ) -> Result<Option<Participant>, DirectoryError> {
        let row: Option<ParticipantRow> =
            sqlx::query_as("SELECT id, timezone, archived_at FROM participants WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Participant::from))
    }

    async fn ensure_participant(&self, id: &ParticipantId) -> Result<Participant, DirectoryError> {
        let row: ParticipantRow = sqlx::query_as(
            r#"
            INSERT INTO participants (id)
            VALUES ($1)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING id, timezone, archived_at
            "#,
        )
        .bind(id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn save_participant(&self, participant: &Participant) -> Result<(), DirectoryError> {
        let archived = participant.lifecycle == ProfileLifecycle::Archived;
        sqlx::query(
            r#"
            INSERT INTO participants (id, timezone, archived_at)
            VALUES ($1, $2, CASE WHEN $3 THEN NOW() ELSE NULL END)
            ON CONFLICT (id) DO UPDATE
            SET timezone = EXCLUDED.timezone,
                archived_at = CASE
                    WHEN $3 THEN COALESCE(participants.archived_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            "#,
        )
        .bind(participant.id.as_str())
        .bind(participant.timezone.as_deref())
        .bind(archived)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_member(
        &self,
        standup: StandupId,
        participant: &ParticipantId,
    ) -> Result<bool, DirectoryError> {
        self.standup_exists(standup).await?;

        let mut tx = self.pool.begin().await?;
        let already: Option<(i64,)> = sqlx::query_as(
            "SELECT standup_id FROM standup_participants WHERE standup_id = $1 AND participant_id = $2",
        )
        .bind(standup.get())
        .bind(participant.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        if already.is_some() {
            return Ok(false);
        }

        Self::grant_profile(&mut tx, participant).await?;
        let added = Self::insert_membership(&mut tx, standup, participant).await?;
        tx.commit().await?;
        Ok(added)
    }

    async fn remove_member(
        &self,
        standup: StandupId,
        participant: &ParticipantId,
    ) -> Result<bool, DirectoryError> {
        self.standup_exists(standup).await?;

        let result = sqlx::query(
            "DELETE FROM standup_participants WHERE standup_id = $1 AND participant_id = $2",
        )
        .bind(standup.get())
        .bind(participant.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_memberships(&self, participant: &ParticipantId) -> Result<u64, DirectoryError> {
        let result = sqlx::query("DELETE FROM standup_participants WHERE participant_id = $1")
            .bind(participant.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl HistoryLedger for PgDirectory {
    async fn create(&self, record: NewHistoryRecord) -> Result<HistoryRecord, DirectoryError> {
        let answers = serde_json::to_value(&record.answers).map_err(|e| {
            DirectoryError::StorageFailed {
                reason: format!("failed to serialize answers: {e}"),
            }
        })?;

        let row: HistoryRow = sqlx::query_as(
            r#"
            INSERT INTO standup_history (participant_id, standup_id, date, answers, skipped)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, participant_id, standup_id, date, answers, skipped, created_at
            "#,
        )
        .bind(record.participant.as_str())
        .bind(record.standup.get())
        .bind(record.date)
        .bind(&answers)
        .bind(record.outcome == HistoryOutcome::Skipped)
        .fetch_one(&self.pool)
        .await?;

        let record = row.try_into_record()?;
        tracing::debug!(
            participant = %record.participant,
            standup = %record.standup,
            date = %record.date,
            "Wrote history record"
        );
        Ok(record)
    }

    async fn exists(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
        date: NaiveDate,
    ) -> Result<bool, DirectoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM standup_history
                WHERE participant_id = $1 AND standup_id = $2 AND date = $3
            )
            "#,
        )
        .bind(participant.as_str())
        .bind(standup.get())
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn query(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
        since: NaiveDate,
    ) -> Result<Vec<HistoryRecord>, DirectoryError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, participant_id, standup_id, date, answers, skipped, created_at
            FROM standup_history
            WHERE participant_id = $1 AND standup_id = $2 AND date >= $3
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(participant.as_str())
        .bind(standup.get())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(HistoryRow::try_into_record)
            .collect::<Result<_, _>>()?)
    }
}
