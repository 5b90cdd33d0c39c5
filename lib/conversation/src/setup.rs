//! Team-setup wizard.
//!
//! `create-standup` collects the header in one step, then the wizard loops
//! `CollectQuestion(n) → CollectQuestion(n+1) | Finalize`. Questions
//! accumulate in the `SessionKey::SetupWizard` session.

use crate::controller::{FlowController, require_guild};
use crate::error::{FlowError, SETUP_RESTART_HINT};
use crate::form::{FormField, FormValues};
use crate::gateway::{InteractionToken, Invoker, OutboundMessage, Reply, Response};
use crate::render;
use huddle_core::{ChannelId, ParticipantId};
use huddle_directory::{ActiveDays, DirectoryError, NewStandup, TriggerTime, ValidationError};
use huddle_session::{SessionKey, SessionState, SetupDraft};
use regex::Regex;
use std::sync::OnceLock;

/// Header fields of `create-standup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    pub name: String,
    pub channel: Option<ChannelId>,
    pub members: String,
    pub time: Option<String>,
}

fn mention_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<@!?(\d+)>").expect("mention pattern is valid"))
}

/// Extracts user mentions in order of first appearance, without duplicates.
#[must_use]
pub fn parse_mentions(raw: &str) -> Vec<ParticipantId> {
    let mut found: Vec<ParticipantId> = Vec::new();
    for capture in mention_pattern().captures_iter(raw) {
        let id = ParticipantId::new(&capture[1]);
        if !found.contains(&id) {
            found.push(id);
        }
    }
    found
}

impl FlowController {
    /// `create-standup`: validate the header and ask for question 1.
    pub(crate) async fn begin_setup(
        &self,
        invoker: &Invoker,
        request: SetupRequest,
    ) -> Result<Response, FlowError> {
        let guild = require_guild(invoker)?.clone();
        if !invoker.is_admin {
            return Err(FlowError::unauthorized(
                "Only Server Admins can create new standups.",
            ));
        }

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(DirectoryError::from(ValidationError::EmptyName).into());
        }
        let trigger_time = match request.time.as_deref() {
            Some(raw) => raw
                .parse::<TriggerTime>()
                .map_err(|_| FlowError::validation(render::INVALID_TIME))?,
            None => TriggerTime::default(),
        };

        match self.directory.find_standup(&guild, &name).await {
            Ok(_) => {
                return Err(DirectoryError::DuplicateName { guild, name }.into());
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let draft = SetupDraft {
            name,
            report_channel: request.channel,
            members_raw: request.members,
            trigger_time: trigger_time.to_string(),
        };
        let state = SessionState::setup(invoker.participant.clone(), guild, draft);
        self.sessions
            .save(
                &SessionKey::setup(invoker.participant.clone()),
                &state,
                self.session_ttl,
            )
            .await?;

        Ok(Response::reply(Reply::Form(render::setup_question_form(1))))
    }

    /// "Add Question N".
    pub(crate) async fn ask_setup_question(
        &self,
        invoker: &Invoker,
        number: usize,
    ) -> Result<Response, FlowError> {
        let state = self.setup_session(&invoker.participant).await?;
        if number != state.step + 1 {
            return Err(stale_question());
        }
        Ok(Response::reply(Reply::Form(render::setup_question_form(
            number,
        ))))
    }

    /// A setup question form was submitted.
    pub(crate) async fn submit_setup_question(
        &self,
        invoker: &Invoker,
        number: usize,
        fields: &FormValues,
    ) -> Result<Response, FlowError> {
        let key = SessionKey::setup(invoker.participant.clone());
        let mut state = self.setup_session(&invoker.participant).await?;
        if number != state.step + 1 {
            return Err(stale_question());
        }
        let question = fields.required(FormField::QuestionText)?;

        state.push_answer(question);
        self.sessions.save(&key, &state, self.session_ttl).await?;

        let message = render::setup_question_saved(number, question);
        Ok(if number == 1 {
            Response::message(message)
        } else {
            Response::update(message)
        })
    }

    /// "Finish & Create": validate now, create and notify in the follow-up.
    pub(crate) async fn finalize_setup(
        &self,
        invoker: &Invoker,
        token: &InteractionToken,
    ) -> Result<Response, FlowError> {
        let manager = invoker.participant.clone();
        let state = self.setup_session(&manager).await?;
        let draft = state.setup.ok_or(FlowError::SessionExpired {
            restart_hint: SETUP_RESTART_HINT,
        })?;
        let guild = state.guild.ok_or(FlowError::SessionExpired {
            restart_hint: SETUP_RESTART_HINT,
        })?;
        let trigger_time = draft
            .trigger_time
            .parse::<TriggerTime>()
            .map_err(|_| FlowError::validation(render::INVALID_TIME))?;

        let invited: Vec<ParticipantId> = parse_mentions(&draft.members_raw)
            .into_iter()
            .filter(|p| p != &manager)
            .collect();
        let mut members = invited.clone();
        members.push(manager.clone());

        let new = NewStandup {
            guild_id: guild,
            name: draft.name,
            manager_id: manager.clone(),
            report_channel: draft.report_channel,
            questions: state.answers,
            trigger_time,
            active_days: ActiveDays::default(),
            members,
        }
        .normalized()
        .map_err(DirectoryError::from)?;

        let controller = self.clone();
        let token = token.clone();
        Ok(Response::reply(Reply::Deferred).with_follow_up(async move {
            controller.create_from_setup(token, new, invited).await;
        }))
    }

    async fn create_from_setup(
        &self,
        token: InteractionToken,
        new: NewStandup,
        invited: Vec<ParticipantId>,
    ) {
        let manager = new.manager_id.clone();
        let standup = match self.directory.create_standup(new).await {
            Ok(standup) => standup,
            Err(e) => {
                let err = FlowError::from(e);
                tracing::warn!(participant = %manager, error = %err, "Standup creation failed");
                self.edit_or_log(&token, OutboundMessage::ephemeral(err.user_message()))
                    .await;
                return;
            }
        };
        tracing::info!(
            standup = %standup.id,
            guild = %standup.guild_id,
            questions = standup.questions.len(),
            members = invited.len(),
            "Standup created"
        );

        if let Err(e) = self.sessions.delete(&SessionKey::setup(manager.clone())).await {
            tracing::warn!(participant = %manager, error = %e, "Failed to delete setup session");
        }

        let manager_zone = self.zone_of(&manager).await;
        self.edit_or_log(
            &token,
            render::setup_created(&standup, manager_zone.as_deref(), invited.len()),
        )
        .await;

        for member in &invited {
            let zone = self.zone_of(member).await;
            self.notify(member, render::welcome(&standup, zone.as_deref()))
                .await;
        }
    }

    /// The participant's configured zone; lookup failures read as unset.
    pub(crate) async fn zone_of(&self, participant: &ParticipantId) -> Option<String> {
        match self.directory.get_participant(participant).await {
            Ok(profile) => profile.and_then(|p| p.timezone().map(str::to_string)),
            Err(e) => {
                tracing::warn!(participant = %participant, error = %e, "Failed to load profile");
                None
            }
        }
    }

    async fn edit_or_log(&self, token: &InteractionToken, message: OutboundMessage) {
        if let Err(e) = self.gateway.edit_reply(token, message).await {
            tracing::warn!(error = %e, "Failed to edit deferred reply");
        }
    }

    async fn setup_session(&self, participant: &ParticipantId) -> Result<SessionState, FlowError> {
        self.sessions
            .get(&SessionKey::setup(participant.clone()))
            .await
            .map_err(|e| FlowError::from_session(e, SETUP_RESTART_HINT))
    }
}

fn stale_question() -> FlowError {
    FlowError::validation("That question was already saved. Please continue from the latest message.")
}
