//! Timezone selection.

use crate::controller::FlowController;
use crate::error::FlowError;
use crate::gateway::{Invoker, OutboundMessage, Response};
use crate::render;
use chrono_tz::Tz;
use huddle_core::StandupId;
use huddle_session::{SessionKey, SessionState};

impl FlowController {
    /// `timezone`, or the prompt's "Set Timezone" button: remember the
    /// request and show the zone menu. A `resume` standup is started again
    /// once a zone is picked.
    pub(crate) async fn timezone_command(
        &self,
        invoker: &Invoker,
        resume: Option<StandupId>,
    ) -> Result<Response, FlowError> {
        let state = SessionState::pending_timezone(
            invoker.participant.clone(),
            invoker.guild.clone(),
            resume,
        );
        self.sessions
            .save(
                &SessionKey::timezone(invoker.participant.clone()),
                &state,
                self.session_ttl,
            )
            .await?;
        Ok(Response::message(render::timezone_menu()))
    }

    /// A zone was picked from the menu.
    pub(crate) async fn select_timezone(
        &self,
        invoker: &Invoker,
        values: &[String],
    ) -> Result<Response, FlowError> {
        let name = values
            .first()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FlowError::validation("Please select a timezone."))?;
        let zone: Tz = name
            .parse()
            .map_err(|_| FlowError::validation(format!("`{name}` is not a known timezone.")))?;

        let mut profile = self.directory.ensure_participant(&invoker.participant).await?;
        profile.timezone = Some(zone.name().to_string());
        self.directory.save_participant(&profile).await?;
        tracing::info!(participant = %profile.id, timezone = zone.name(), "Timezone set");

        let key = SessionKey::timezone(invoker.participant.clone());
        let resume = match self.sessions.get(&key).await {
            Ok(pending) => pending.standup,
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(participant = %invoker.participant, error = %e, "Failed to load pending timezone session");
                }
                None
            }
        };
        if let Err(e) = self.sessions.delete(&key).await {
            tracing::warn!(participant = %invoker.participant, error = %e, "Failed to delete pending timezone session");
        }

        let response = Response::update(OutboundMessage::ephemeral(format!(
            "✅ Timezone set to `{}`!",
            zone.name()
        )));
        let Some(standup) = resume else {
            return Ok(response);
        };

        let controller = self.clone();
        let participant = invoker.participant.clone();
        Ok(response.with_follow_up(async move {
            match controller.initiate(&participant, None, Some(standup)).await {
                Ok(outcome) => {
                    tracing::debug!(participant = %participant, outcome = ?outcome, "Resumed after timezone selection");
                }
                Err(e) => {
                    tracing::warn!(participant = %participant, error = %e, "Failed to resume standup");
                }
            }
        }))
    }
}
