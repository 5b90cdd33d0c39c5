//! Report submission.
//!
//! `Idle → [AwaitingStandupSelection] → AwaitingAnswer[0..N] → Complete`, with
//! `Skip` available from the initial prompt. The session under
//! `SessionKey::Report` carries the answers collected so far.

use crate::controller::{FALLBACK_ZONE, FlowController};
use crate::error::{FlowError, REPORT_RESTART_HINT};
use crate::form::{FormField, FormValues};
use crate::gateway::{Invoker, OutboundMessage, Reply, Response};
use crate::render;
use huddle_core::{GuildId, ParticipantId, StandupId};
use huddle_directory::{NewHistoryRecord, Participant, Standup};
use huddle_session::{SessionKey, SessionState};

/// Result of asking to start a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The prompt was sent and a session is waiting for the first answer.
    Prompted(Standup),
    /// Several standups qualify; the participant must pick one.
    SelectionRequired(Vec<Standup>),
    /// The participant belongs to no standup. No session was created.
    NoMembership,
    /// The participant's standups all live in other guilds.
    NotInGuild,
    /// The requested standup does not include the participant.
    NotAMember,
}

impl StartOutcome {
    /// The reply shown to whoever asked to start.
    #[must_use]
    pub fn reply(&self) -> OutboundMessage {
        match self {
            Self::Prompted(standup) => OutboundMessage::ephemeral(format!(
                "📬 Your **{}** standup is waiting in your direct messages.",
                standup.name
            )),
            Self::SelectionRequired(standups) => render::standup_selection(standups),
            Self::NoMembership => OutboundMessage::ephemeral(render::NO_MEMBERSHIP),
            Self::NotInGuild => OutboundMessage::ephemeral(render::NOT_IN_GUILD),
            Self::NotAMember => OutboundMessage::ephemeral(render::NOT_A_MEMBER),
        }
    }
}

impl FlowController {
    /// Entry point shared by the `start` command, the selection menu, the
    /// timezone menu, and the scheduler.
    ///
    /// With a `target`, only that standup is considered. Without one, the
    /// participant's standups are narrowed to `guild` (when given) and a
    /// selection is requested if more than one remains.
    ///
    /// # Errors
    ///
    /// Returns `Transient` if a store or the gateway fails.
    #[tracing::instrument(skip(self, guild), fields(participant = %participant))]
    pub async fn initiate(
        &self,
        participant: &ParticipantId,
        guild: Option<&GuildId>,
        target: Option<StandupId>,
    ) -> Result<StartOutcome, FlowError> {
        let Some(profile) = self.directory.get_participant(participant).await? else {
            return Ok(StartOutcome::NoMembership);
        };
        let memberships = self.directory.standups_for(participant).await?;
        if memberships.is_empty() {
            return Ok(StartOutcome::NoMembership);
        }

        let standup = match target {
            Some(id) => match memberships.into_iter().find(|s| s.id == id) {
                Some(standup) => standup,
                None => return Ok(StartOutcome::NotAMember),
            },
            None => {
                let mut candidates: Vec<Standup> = memberships
                    .into_iter()
                    .filter(|s| guild.is_none_or(|g| &s.guild_id == g))
                    .collect();
                match candidates.len() {
                    0 => return Ok(StartOutcome::NotInGuild),
                    1 => candidates.remove(0),
                    _ => return Ok(StartOutcome::SelectionRequired(candidates)),
                }
            }
        };

        self.begin_report(profile, &standup).await?;
        Ok(StartOutcome::Prompted(standup))
    }

    /// Resolves the participant's zone, opens the session, and sends the prompt.
    async fn begin_report(&self, mut profile: Participant, standup: &Standup) -> Result<(), FlowError> {
        let timezone = self.resolve_timezone(&mut profile, standup).await?;

        let on_fallback = timezone == FALLBACK_ZONE;
        let mut notes = Vec::new();
        if on_fallback {
            notes.push(render::UTC_NOTE);
        }
        if standup.report_channel.is_none() {
            notes.push(render::NO_DESTINATION_WARNING);
        }

        let key = SessionKey::report(profile.id.clone(), standup.id);
        let state = SessionState::report(profile.id.clone(), Some(standup.guild_id.clone()), standup.id);
        self.sessions.save(&key, &state, self.session_ttl).await?;

        self.gateway
            .send_direct(&profile.id, render::report_prompt(standup, &notes, on_fallback))
            .await?;

        tracing::info!(participant = %profile.id, standup = %standup.id, "Report prompt sent");
        Ok(())
    }

    /// Returns the participant's zone, first inheriting and persisting the
    /// manager's (or the fallback) when none is set.
    async fn resolve_timezone(
        &self,
        profile: &mut Participant,
        standup: &Standup,
    ) -> Result<String, FlowError> {
        if let Some(tz) = profile.timezone() {
            return Ok(tz.to_string());
        }

        let inherited = self
            .directory
            .get_participant(&standup.manager_id)
            .await?
            .and_then(|manager| manager.timezone().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_ZONE.to_string());

        profile.timezone = Some(inherited.clone());
        self.directory.save_participant(profile).await?;
        tracing::info!(participant = %profile.id, timezone = %inherited, "Inherited timezone");
        Ok(inherited)
    }

    /// `start [standup]`.
    pub(crate) async fn start_command(
        &self,
        invoker: &Invoker,
        standup: Option<&str>,
    ) -> Result<Response, FlowError> {
        let target = match standup {
            Some(name) => {
                let found = self
                    .directory
                    .standups_for(&invoker.participant)
                    .await?
                    .into_iter()
                    .find(|s| {
                        s.name == name && invoker.guild.as_ref().is_none_or(|g| &s.guild_id == g)
                    });
                match found {
                    Some(s) => Some(s.id),
                    None => {
                        return Ok(Response::message(OutboundMessage::ephemeral(
                            render::NOT_A_MEMBER,
                        )));
                    }
                }
            }
            None => None,
        };

        let outcome = self
            .initiate(&invoker.participant, invoker.guild.as_ref(), target)
            .await?;
        Ok(Response::message(outcome.reply()))
    }

    /// The selection menu's choice.
    pub(crate) async fn select_standup(
        &self,
        invoker: &Invoker,
        values: &[String],
    ) -> Result<Response, FlowError> {
        let id: StandupId = values
            .first()
            .ok_or_else(|| FlowError::validation("Please select a standup."))?
            .parse()
            .map_err(|_| FlowError::validation("That selection is no longer valid."))?;

        let outcome = self.initiate(&invoker.participant, None, Some(id)).await?;
        Ok(Response::update(outcome.reply()))
    }

    /// "Fill Standup": restart the session and ask the first question.
    pub(crate) async fn fill_report(
        &self,
        invoker: &Invoker,
        standup: StandupId,
    ) -> Result<Response, FlowError> {
        let standup = self.member_standup(&invoker.participant, standup).await?;

        let key = SessionKey::report(invoker.participant.clone(), standup.id);
        let state = SessionState::report(
            invoker.participant.clone(),
            Some(standup.guild_id.clone()),
            standup.id,
        );
        self.sessions.save(&key, &state, self.session_ttl).await?;

        Ok(Response::reply(Reply::Form(render::answer_form(&standup, 0))))
    }

    /// "Next: Question N".
    pub(crate) async fn continue_report(
        &self,
        invoker: &Invoker,
        standup: StandupId,
        index: usize,
    ) -> Result<Response, FlowError> {
        let key = SessionKey::report(invoker.participant.clone(), standup);
        let state = self.report_session(&key).await?;
        if index != state.step {
            return Err(stale_step());
        }

        let standup = self.directory.get_standup(standup).await?;
        if state.step >= standup.questions.len() {
            return self.complete(&standup, &key, state).await;
        }
        Ok(Response::reply(Reply::Form(render::answer_form(
            &standup, state.step,
        ))))
    }

    /// An answer form was submitted.
    pub(crate) async fn submit_answer(
        &self,
        invoker: &Invoker,
        standup: StandupId,
        index: usize,
        fields: &FormValues,
    ) -> Result<Response, FlowError> {
        let key = SessionKey::report(invoker.participant.clone(), standup);
        let mut state = self.report_session(&key).await?;
        if index != state.step {
            return Err(stale_step());
        }
        let answer = fields.required(FormField::AnswerText)?;

        let standup = self.directory.get_standup(standup).await?;
        state.push_answer(answer);

        if state.step < standup.questions.len() {
            self.sessions.save(&key, &state, self.session_ttl).await?;
            return Ok(Response::update(render::answer_saved(&standup, index)));
        }
        self.complete(&standup, &key, state).await
    }

    /// Writes the day's record, publishes the report, and ends the session.
    async fn complete(
        &self,
        standup: &Standup,
        key: &SessionKey,
        state: SessionState,
    ) -> Result<Response, FlowError> {
        let participant = state.participant;
        let date = self.local_today(&participant).await?;

        if self.ledger.exists(&participant, standup.id, date).await? {
            self.end_session(key).await;
            return Err(already_reported(standup));
        }

        self.ledger
            .create(NewHistoryRecord::submitted(
                participant.clone(),
                standup.id,
                date,
                state.answers.clone(),
            ))
            .await?;
        self.end_session(key).await;
        tracing::info!(participant = %participant, standup = %standup.id, %date, "Report completed");

        let embed = render::report_embed(standup, &participant, &state.answers, self.now());
        let published = self
            .publish(standup, OutboundMessage::default().with_embed(embed))
            .await;

        let text = if published {
            render::REPORT_COMPLETE
        } else {
            render::REPORT_SAVED
        };
        Ok(Response::update(OutboundMessage::text(text)))
    }

    /// "Skip Today".
    pub(crate) async fn skip_report(
        &self,
        invoker: &Invoker,
        standup: StandupId,
    ) -> Result<Response, FlowError> {
        let participant = &invoker.participant;
        let standup = self.member_standup(participant, standup).await?;
        let key = SessionKey::report(participant.clone(), standup.id);
        let date = self.local_today(participant).await?;

        if self.ledger.exists(participant, standup.id, date).await? {
            self.end_session(&key).await;
            return Err(already_reported(&standup));
        }

        self.ledger
            .create(NewHistoryRecord::skipped(participant.clone(), standup.id, date))
            .await?;
        self.end_session(&key).await;
        tracing::info!(participant = %participant, standup = %standup.id, %date, "Report skipped");

        let embed = render::skipped_embed(&standup, participant, self.now());
        let published = self
            .publish(&standup, OutboundMessage::default().with_embed(embed))
            .await;

        let text = if published {
            render::SKIP_CONFIRMED
        } else {
            render::SKIP_SAVED
        };
        Ok(Response::update(OutboundMessage::text(text)))
    }

    async fn report_session(&self, key: &SessionKey) -> Result<SessionState, FlowError> {
        self.sessions
            .get(key)
            .await
            .map_err(|e| FlowError::from_session(e, REPORT_RESTART_HINT))
    }

    async fn end_session(&self, key: &SessionKey) {
        if let Err(e) = self.sessions.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete finished session");
        }
    }

    /// Gets a standup the participant belongs to.
    async fn member_standup(
        &self,
        participant: &ParticipantId,
        standup: StandupId,
    ) -> Result<Standup, FlowError> {
        self.directory
            .standups_for(participant)
            .await?
            .into_iter()
            .find(|s| s.id == standup)
            .ok_or_else(|| FlowError::not_found("You are no longer a member of this standup."))
    }
}

fn stale_step() -> FlowError {
    FlowError::validation("That question was already answered. Please continue from the latest message.")
}

fn already_reported(standup: &Standup) -> FlowError {
    FlowError::validation(format!(
        "You have already submitted or skipped **{}** today.",
        standup.name
    ))
}
