//! The periodic trigger scan.

use crate::error::ScheduleError;
use crate::trigger::due;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use huddle_conversation::{FlowController, MessagingGateway, StartOutcome, render};
use huddle_core::{ParticipantId, StandupId};
use huddle_directory::{DirectoryStore, HistoryLedger, Participant, Standup};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Tick interval of the trigger loop.
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// Starts a report flow for a participant, as a manual start would.
#[async_trait]
pub trait FlowLauncher: Send + Sync {
    async fn launch(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
    ) -> Result<(), ScheduleError>;
}

#[async_trait]
impl FlowLauncher for FlowController {
    async fn launch(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
    ) -> Result<(), ScheduleError> {
        let outcome = self
            .initiate(participant, None, Some(standup))
            .await
            .map_err(|e| ScheduleError::LaunchFailed {
                participant: participant.clone(),
                standup,
                reason: e.to_string(),
            })?;
        if !matches!(outcome, StartOutcome::Prompted(_)) {
            tracing::debug!(participant = %participant, standup = %standup, outcome = ?outcome, "Scheduled start did not prompt");
        }
        Ok(())
    }
}

/// Counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Participant/standup pairs examined.
    pub checked: usize,
    /// Pairs reminded and started.
    pub fired: usize,
    /// Pairs that failed; the scan continued past them.
    pub failed: usize,
}

/// Scans every standup roster and fires the triggers that are due.
pub struct TriggerEngine {
    directory: Arc<dyn DirectoryStore>,
    ledger: Arc<dyn HistoryLedger>,
    gateway: Arc<dyn MessagingGateway>,
    launcher: Arc<dyn FlowLauncher>,
}

impl TriggerEngine {
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        ledger: Arc<dyn HistoryLedger>,
        gateway: Arc<dyn MessagingGateway>,
        launcher: Arc<dyn FlowLauncher>,
    ) -> Self {
        Self {
            directory,
            ledger,
            gateway,
            launcher,
        }
    }

    /// Runs one scan at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the rosters cannot be loaded. Failures for a
    /// single participant are logged and counted.
    #[tracing::instrument(skip(self), fields(now = %now))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, ScheduleError> {
        let rosters = self.directory.list_rosters().await?;
        let mut report = TickReport::default();

        for roster in &rosters {
            for participant in &roster.participants {
                report.checked += 1;
                match self.fire_if_due(now, participant, &roster.standup).await {
                    Ok(true) => report.fired += 1,
                    Ok(false) => {}
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            participant = %participant.id,
                            standup = %roster.standup.id,
                            error = %e,
                            "Trigger failed"
                        );
                    }
                }
            }
        }

        if report.fired > 0 || report.failed > 0 {
            tracing::info!(
                checked = report.checked,
                fired = report.fired,
                failed = report.failed,
                "Trigger scan finished"
            );
        }
        Ok(report)
    }

    async fn fire_if_due(
        &self,
        now: DateTime<Utc>,
        participant: &Participant,
        standup: &Standup,
    ) -> Result<bool, ScheduleError> {
        let Some(today) = due(now, participant, standup)? else {
            return Ok(false);
        };
        if self.ledger.exists(&participant.id, standup.id, today).await? {
            tracing::debug!(participant = %participant.id, standup = %standup.id, %today, "Already reported today");
            return Ok(false);
        }

        self.gateway
            .send_direct(&participant.id, render::reminder(standup))
            .await
            .map_err(|e| ScheduleError::NotifyFailed {
                participant: participant.id.clone(),
                reason: e.to_string(),
            })?;
        self.launcher.launch(&participant.id, standup.id).await?;

        tracing::info!(participant = %participant.id, standup = %standup.id, %today, "Standup triggered");
        Ok(true)
    }

    /// Scans every `every` until the process exits.
    ///
    /// A scan in progress finishes before the next one starts; late ticks
    /// are delayed rather than bunched.
    pub async fn run(&self, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(every_secs = every.as_secs(), "Trigger engine started");

        loop {
            interval.tick().await;
            if let Err(e) = self.tick(Utc::now()).await {
                tracing::warn!(error = %e, "Trigger scan failed");
            }
        }
    }
}

impl fmt::Debug for TriggerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerEngine").finish_non_exhaustive()
    }
}
