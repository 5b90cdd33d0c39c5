//! The flow controller and the helpers its conversations share.
//!
//! Conversation logic lives in sibling modules as further `impl FlowController`
//! blocks: `flow` (report submission), `setup` (team-setup wizard),
//! `dashboard` (settings and question editing), `admin` (membership and read
//! views), and `timezone`.

use crate::error::FlowError;
use crate::gateway::{Invoker, MessagingGateway, OutboundMessage};
use crate::render;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use huddle_core::{GuildId, ParticipantId};
use huddle_directory::{DirectoryStore, HistoryLedger, Standup};
use huddle_session::{DEFAULT_TTL, SessionStore};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Source of the current instant.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Zone name used when a participant has none and nothing can be inherited.
pub const FALLBACK_ZONE: &str = "UTC";

/// Turns inbound interactions into state transitions and outbound messages.
///
/// Cheap to clone; follow-up work captures a clone.
#[derive(Clone)]
pub struct FlowController {
    pub(crate) directory: Arc<dyn DirectoryStore>,
    pub(crate) ledger: Arc<dyn HistoryLedger>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) gateway: Arc<dyn MessagingGateway>,
    pub(crate) session_ttl: Duration,
    clock: Clock,
}

impl FlowController {
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        ledger: Arc<dyn HistoryLedger>,
        sessions: Arc<dyn SessionStore>,
        gateway: Arc<dyn MessagingGateway>,
    ) -> Self {
        Self {
            directory,
            ledger,
            sessions,
            gateway,
            session_ttl: DEFAULT_TTL,
            clock: Arc::new(Utc::now),
        }
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Replaces the clock. Tests pin it to a fixed instant.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Today's calendar date in the participant's zone.
    pub(crate) async fn local_today(&self, participant: &ParticipantId) -> Result<NaiveDate, FlowError> {
        let profile = self.directory.get_participant(participant).await?;
        let tz = zone(profile.as_ref().and_then(|p| p.timezone()));
        Ok(self.now().with_timezone(&tz).date_naive())
    }

    /// Looks up a standup by name in the invoker's guild.
    pub(crate) async fn standup_named(
        &self,
        invoker: &Invoker,
        name: &str,
    ) -> Result<Standup, FlowError> {
        let guild = require_guild(invoker)?;
        Ok(self.directory.find_standup(guild, name).await?)
    }

    /// Sends a direct message that is allowed to fail.
    pub(crate) async fn notify(&self, recipient: &ParticipantId, message: OutboundMessage) {
        if let Err(e) = self.gateway.send_direct(recipient, message).await {
            tracing::warn!(participant = %recipient, error = %e, "Failed to deliver direct message");
        }
    }

    /// Posts to a standup's report channel, if it has one. Failures are logged.
    pub(crate) async fn publish(&self, standup: &Standup, message: OutboundMessage) -> bool {
        let Some(channel) = &standup.report_channel else {
            tracing::debug!(standup = %standup.id, "No report channel, skipping publication");
            return false;
        };
        match self.gateway.send_channel(channel, message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(standup = %standup.id, channel = %channel, error = %e, "Failed to publish report");
                false
            }
        }
    }
}

impl fmt::Debug for FlowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowController")
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}

/// Resolves a zone name, falling back to UTC for missing or unknown names.
#[must_use]
pub fn zone(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse::<Tz>().ok()).unwrap_or(Tz::UTC)
}

pub(crate) fn require_guild(invoker: &Invoker) -> Result<&GuildId, FlowError> {
    invoker
        .guild
        .as_ref()
        .ok_or_else(|| FlowError::validation("This command can only be used inside a server."))
}

/// Allows the standup's manager, or an administrator of the standup's guild.
pub(crate) fn authorize_manager(standup: &Standup, invoker: &Invoker) -> Result<(), FlowError> {
    let admin_here = invoker.is_admin && invoker.guild.as_ref() == Some(&standup.guild_id);
    if standup.is_managed_by(&invoker.participant) || admin_here {
        return Ok(());
    }
    tracing::info!(
        participant = %invoker.participant,
        standup = %standup.id,
        "Rejected manager action"
    );
    Err(FlowError::unauthorized(render::NOT_MANAGER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::{ChannelId, StandupId};
    use huddle_directory::{ActiveDays, TriggerTime};

    fn standup() -> Standup {
        Standup {
            id: StandupId::new(1),
            guild_id: GuildId::new("g"),
            name: "Ops".to_string(),
            manager_id: ParticipantId::new("m"),
            report_channel: Some(ChannelId::new("c")),
            questions: vec!["q".to_string()],
            trigger_time: TriggerTime::default(),
            active_days: ActiveDays::BUSINESS,
            created_at: Utc::now(),
        }
    }

    fn invoker(id: &str, is_admin: bool) -> Invoker {
        Invoker {
            participant: ParticipantId::new(id),
            guild: Some(GuildId::new("g")),
            channel: None,
            is_admin,
        }
    }

    #[test]
    fn zone_falls_back_to_utc() {
        assert_eq!(zone(Some("Asia/Kolkata")), Tz::Asia__Kolkata);
        assert_eq!(zone(Some("Mars/Olympus")), Tz::UTC);
        assert_eq!(zone(None), Tz::UTC);
    }

    #[test]
    fn manager_and_admin_are_authorized() {
        assert!(authorize_manager(&standup(), &invoker("m", false)).is_ok());
        assert!(authorize_manager(&standup(), &invoker("x", true)).is_ok());
        assert!(matches!(
            authorize_manager(&standup(), &invoker("x", false)),
            Err(FlowError::Unauthorized { .. })
        ));
    }

    #[test]
    fn admin_of_another_guild_is_rejected() {
        let mut foreign = invoker("x", true);
        foreign.guild = Some(GuildId::new("elsewhere"));
        assert!(matches!(
            authorize_manager(&standup(), &foreign),
            Err(FlowError::Unauthorized { .. })
        ));

        let mut dm = invoker("x", true);
        dm.guild = None;
        assert!(authorize_manager(&standup(), &dm).is_err());
    }

    #[test]
    fn guild_required() {
        let mut dm = invoker("u", false);
        dm.guild = None;
        assert!(matches!(require_guild(&dm), Err(FlowError::Validation { .. })));
    }
}
