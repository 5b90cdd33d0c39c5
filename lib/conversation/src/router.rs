//! Dispatch of classified interactions to the flow controller.

use crate::action::{ComponentAction, FormKind};
use crate::commands::{Command, CommandInvocation, CommandRegistry};
use crate::controller::FlowController;
use crate::dashboard::SettingsChange;
use crate::error::FlowError;
use crate::form::FormValues;
use crate::gateway::{
    AutocompleteRequest, Interaction, InteractionKind, InteractionToken, Invoker, OutboundMessage,
    Reply, Response,
};
use crate::setup::SetupRequest;
use std::sync::Arc;

/// Entry point for every inbound interaction.
#[derive(Debug, Clone)]
pub struct InteractionRouter {
    controller: FlowController,
    registry: Arc<CommandRegistry>,
}

impl InteractionRouter {
    #[must_use]
    pub fn new(controller: FlowController, registry: Arc<CommandRegistry>) -> Self {
        Self {
            controller,
            registry,
        }
    }

    /// Handles one interaction. Failures become an ephemeral error reply.
    #[tracing::instrument(skip(self, interaction), fields(participant = %interaction.invoker.participant))]
    pub async fn handle(&self, interaction: Interaction) -> Response {
        let Interaction {
            token,
            invoker,
            kind,
        } = interaction;

        let result = match kind {
            InteractionKind::Command(invocation) => self.command(&invoker, &invocation).await,
            InteractionKind::Autocomplete(request) => {
                return self.autocomplete(&invoker, &request).await;
            }
            InteractionKind::Component { action, values } => {
                self.component(&invoker, &token, action, &values).await
            }
            InteractionKind::FormSubmit { form, fields } => {
                self.form(&invoker, form, &fields).await
            }
        };

        result.unwrap_or_else(|e| error_response(&invoker, &e))
    }

    async fn command(
        &self,
        invoker: &Invoker,
        invocation: &CommandInvocation,
    ) -> Result<Response, FlowError> {
        let c = &self.controller;
        match Command::parse(invocation)? {
            Command::Start { standup } => c.start_command(invoker, standup.as_deref()).await,
            Command::CreateStandup {
                name,
                channel,
                members,
                time,
            } => {
                c.begin_setup(
                    invoker,
                    SetupRequest {
                        name,
                        channel,
                        members,
                        time,
                    },
                )
                .await
            }
            Command::EditStandup {
                standup,
                new_channel,
                new_time,
            } => {
                c.edit_standup(
                    invoker,
                    &standup,
                    SettingsChange {
                        new_channel,
                        new_time,
                    },
                )
                .await
            }
            Command::DeleteStandup { standup } => c.delete_standup(invoker, &standup).await,
            Command::AddMember { user, standup } => c.add_member(invoker, &user, &standup).await,
            Command::RemoveMember { user, standup } => {
                c.remove_member(invoker, &user, &standup).await
            }
            Command::StandupInfo { standup } => c.standup_info(invoker, &standup).await,
            Command::History {
                user,
                standup,
                days,
            } => c.history(invoker, &user, &standup, days).await,
            Command::Timezone => c.timezone_command(invoker, None).await,
            Command::Help => Ok(Response::message(OutboundMessage::ephemeral(
                self.registry.help_text(),
            ))),
            Command::DeleteMyData => c.delete_my_data(invoker).await,
        }
    }

    async fn component(
        &self,
        invoker: &Invoker,
        token: &InteractionToken,
        action: ComponentAction,
        values: &[String],
    ) -> Result<Response, FlowError> {
        let c = &self.controller;
        match action {
            ComponentAction::FillReport { standup } => c.fill_report(invoker, standup).await,
            ComponentAction::SkipReport { standup } => c.skip_report(invoker, standup).await,
            ComponentAction::ContinueReport { standup, index } => {
                c.continue_report(invoker, standup, index).await
            }
            ComponentAction::SelectStandup => c.select_standup(invoker, values).await,
            ComponentAction::AddSetupQuestion { number } => {
                c.ask_setup_question(invoker, number).await
            }
            ComponentAction::FinalizeSetup => c.finalize_setup(invoker, token).await,
            ComponentAction::EditDays { standup } => c.edit_days(invoker, standup, values).await,
            ComponentAction::OpenQuestions { standup } => c.open_questions(invoker, standup).await,
            ComponentAction::SelectQuestion { standup } => {
                c.select_question(invoker, standup, values).await
            }
            ComponentAction::AddQuestion { standup } => {
                c.prompt_new_question(invoker, standup).await
            }
            ComponentAction::FinishEditing { standup } => c.finish_editing(invoker, standup).await,
            ComponentAction::SetTimezone { standup } => {
                c.timezone_command(invoker, Some(standup)).await
            }
            ComponentAction::SelectTimezone => c.select_timezone(invoker, values).await,
        }
    }

    async fn form(
        &self,
        invoker: &Invoker,
        form: FormKind,
        fields: &FormValues,
    ) -> Result<Response, FlowError> {
        let c = &self.controller;
        match form {
            FormKind::SetupQuestion { number } => {
                c.submit_setup_question(invoker, number, fields).await
            }
            FormKind::ReportAnswer { standup, index } => {
                c.submit_answer(invoker, standup, index, fields).await
            }
            FormKind::EditQuestion { standup, index } => {
                c.submit_question_edit(invoker, standup, index, fields).await
            }
            FormKind::AddQuestion { standup } => {
                c.submit_new_question(invoker, standup, fields).await
            }
        }
    }

    async fn autocomplete(&self, invoker: &Invoker, request: &AutocompleteRequest) -> Response {
        if !self
            .registry
            .is_autocompleted(&request.command, &request.option)
        {
            return Response::reply(Reply::Suggestions(Vec::new()));
        }
        match self.controller.autocomplete(invoker, request).await {
            Ok(choices) => Response::reply(Reply::Suggestions(choices)),
            Err(e) => {
                tracing::debug!(command = %request.command, error = %e, "Autocomplete failed");
                Response::reply(Reply::Suggestions(Vec::new()))
            }
        }
    }
}

fn error_response(invoker: &Invoker, error: &FlowError) -> Response {
    match error {
        FlowError::Transient { .. } => {
            tracing::warn!(participant = %invoker.participant, error = %error, "Interaction failed");
        }
        _ => {
            tracing::debug!(participant = %invoker.participant, error = %error, "Interaction rejected");
        }
    }
    Response::message(OutboundMessage::ephemeral(error.user_message()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingGateway;
    use huddle_core::{GuildId, ParticipantId, StandupId};
    use huddle_directory::InMemoryDirectory;
    use huddle_session::InMemorySessionStore;

    fn router() -> InteractionRouter {
        let directory = InMemoryDirectory::new();
        let controller = FlowController::new(
            Arc::new(directory.clone()),
            Arc::new(directory),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(RecordingGateway::new()),
        );
        InteractionRouter::new(controller, Arc::new(CommandRegistry::standard()))
    }

    fn interaction(kind: InteractionKind) -> Interaction {
        Interaction {
            token: InteractionToken::new("t"),
            invoker: Invoker {
                participant: ParticipantId::new("u"),
                guild: Some(GuildId::new("g")),
                channel: None,
                is_admin: false,
            },
            kind,
        }
    }

    fn content(response: Response) -> String {
        match response.reply {
            Reply::Message(m) | Reply::Update(m) => m.content,
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn help_lists_registered_commands() {
        let response = router()
            .handle(interaction(InteractionKind::Command(
                CommandInvocation::new("help"),
            )))
            .await;
        let text = content(response);
        assert!(text.contains("/start"));
        assert!(text.contains("/create-standup"));
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let text = content(
            router()
                .handle(interaction(InteractionKind::Command(
                    CommandInvocation::new("dance"),
                )))
                .await,
        );
        assert!(text.starts_with("❌"));
    }

    #[tokio::test]
    async fn start_without_membership_is_informational() {
        let text = content(
            router()
                .handle(interaction(InteractionKind::Command(
                    CommandInvocation::new("start"),
                )))
                .await,
        );
        assert!(text.contains("not part of any standups"));
    }

    #[tokio::test]
    async fn expired_answer_asks_for_restart() {
        let text = content(
            router()
                .handle(interaction(InteractionKind::Component {
                    action: ComponentAction::ContinueReport {
                        standup: StandupId::new(1),
                        index: 1,
                    },
                    values: Vec::new(),
                }))
                .await,
        );
        assert!(text.contains("/start"));
    }

    #[tokio::test]
    async fn unknown_autocomplete_option_suggests_nothing() {
        let response = router()
            .handle(interaction(InteractionKind::Autocomplete(
                AutocompleteRequest {
                    command: "help".to_string(),
                    option: "anything".to_string(),
                    value: String::new(),
                },
            )))
            .await;
        assert_eq!(response.reply, Reply::Suggestions(Vec::new()));
    }
}
