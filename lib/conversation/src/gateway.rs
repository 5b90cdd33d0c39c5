//! Messaging Gateway contract.
//!
//! Inbound: classified interactions (command, autocomplete, component, form
//! submission). Outbound: exactly one `Reply` per interaction within the
//! platform's acknowledgment window, plus direct and channel messages sent at
//! any later time through `MessagingGateway`.

use crate::action::{ComponentAction, FormKind, custom_id};
use crate::commands::{CommandInvocation, CommandRegistry};
use crate::error::GatewayError;
use crate::form::{Form, FormValues};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use huddle_core::{ChannelId, GuildId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Token that lets a deferred reply be edited later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionToken(String);

impl InteractionToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who triggered an interaction, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoker {
    pub participant: ParticipantId,
    /// Absent in direct messages.
    #[serde(default)]
    pub guild: Option<GuildId>,
    #[serde(default)]
    pub channel: Option<ChannelId>,
    /// Holds the guild administrator permission.
    #[serde(default)]
    pub is_admin: bool,
}

/// Partial input for an autocompleted command option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteRequest {
    pub command: String,
    pub option: String,
    #[serde(default)]
    pub value: String,
}

/// The classified inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    Command(CommandInvocation),
    Autocomplete(AutocompleteRequest),
    Component {
        #[serde(rename = "custom_id", with = "custom_id")]
        action: ComponentAction,
        #[serde(default)]
        values: Vec<String>,
    },
    FormSubmit {
        #[serde(rename = "custom_id", with = "custom_id")]
        form: FormKind,
        #[serde(default)]
        fields: FormValues,
    },
}

/// One inbound platform event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub token: InteractionToken,
    pub invoker: Invoker,
    pub kind: InteractionKind,
}

/// A named field inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Rich structured block inside a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    #[must_use]
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    #[must_use]
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

/// One entry of a select menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub default: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
            default: false,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn selected(mut self, default: bool) -> Self {
        self.default = default;
        self
    }
}

/// Interactive element attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Button {
        #[serde(rename = "custom_id", with = "custom_id")]
        action: ComponentAction,
        label: String,
        style: ButtonStyle,
    },
    Select {
        #[serde(rename = "custom_id", with = "custom_id")]
        action: ComponentAction,
        placeholder: String,
        options: Vec<SelectOption>,
        min_values: u8,
        max_values: u8,
    },
}

impl Component {
    #[must_use]
    pub fn button(action: ComponentAction, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self::Button {
            action,
            label: label.into(),
            style,
        }
    }

    /// A single-choice select menu.
    #[must_use]
    pub fn select(
        action: ComponentAction,
        placeholder: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self::Select {
            action,
            placeholder: placeholder.into(),
            options,
            min_values: 1,
            max_values: 1,
        }
    }

    #[must_use]
    pub fn action(&self) -> ComponentAction {
        match self {
            Self::Button { action, .. } | Self::Select { action, .. } => *action,
        }
    }
}

/// A message body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub components: Vec<Component>,
    /// Visible only to the invoker. Meaningful for interaction replies only.
    #[serde(default)]
    pub ephemeral: bool,
}

impl OutboundMessage {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    #[must_use]
    pub fn with_components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components.extend(components);
        self
    }
}

/// An autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

/// The single acknowledgment sent for an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Reply {
    /// Post a new message.
    Message(OutboundMessage),
    /// Replace the message the component belongs to.
    Update(OutboundMessage),
    /// Acknowledge now; the follow-up edits the reply later.
    Deferred,
    /// Open a modal form.
    Form(Form),
    /// Autocomplete suggestions.
    Suggestions(Vec<Choice>),
}

/// Work to run after the reply has been acknowledged.
pub type FollowUp = BoxFuture<'static, ()>;

/// A reply plus optional deferred work.
pub struct Response {
    pub reply: Reply,
    pub follow_up: Option<FollowUp>,
}

impl Response {
    #[must_use]
    pub fn reply(reply: Reply) -> Self {
        Self {
            reply,
            follow_up: None,
        }
    }

    #[must_use]
    pub fn message(message: OutboundMessage) -> Self {
        Self::reply(Reply::Message(message))
    }

    #[must_use]
    pub fn update(message: OutboundMessage) -> Self {
        Self::reply(Reply::Update(message))
    }

    #[must_use]
    pub fn with_follow_up(mut self, work: impl Future<Output = ()> + Send + 'static) -> Self {
        self.follow_up = Some(Box::pin(work));
        self
    }

    /// Runs the follow-up, if any, to completion.
    pub async fn finish(self) -> Reply {
        if let Some(work) = self.follow_up {
            work.await;
        }
        self.reply
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("reply", &self.reply)
            .field("follow_up", &self.follow_up.is_some())
            .finish()
    }
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Publishes the command surface.
    async fn register_commands(&self, registry: &CommandRegistry) -> Result<(), GatewayError>;

    /// Sends a direct message to a participant.
    async fn send_direct(
        &self,
        recipient: &ParticipantId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError>;

    /// Posts a message to a channel.
    async fn send_channel(
        &self,
        channel: &ChannelId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError>;

    /// Replaces the reply of a deferred interaction.
    async fn edit_reply(
        &self,
        token: &InteractionToken,
        message: OutboundMessage,
    ) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormField;
    use huddle_core::StandupId;

    #[test]
    fn component_interaction_decodes_typed_action() {
        let action = ComponentAction::SkipReport {
            standup: StandupId::new(4),
        };
        let custom = serde_json::to_string(&action).expect("encode");
        let raw = serde_json::json!({
            "token": "t1",
            "invoker": { "participant": "u1" },
            "kind": { "type": "component", "custom_id": custom, "values": [] }
        });

        let interaction: Interaction = serde_json::from_value(raw).expect("decode");
        assert_eq!(
            interaction.kind,
            InteractionKind::Component {
                action,
                values: Vec::new()
            }
        );
        assert_eq!(interaction.invoker.guild, None);
        assert!(!interaction.invoker.is_admin);
    }

    #[test]
    fn form_submission_decodes_fields() {
        let form = FormKind::ReportAnswer {
            standup: StandupId::new(4),
            index: 0,
        };
        let raw = serde_json::json!({
            "token": "t1",
            "invoker": { "participant": "u1", "guild": "g1", "is_admin": true },
            "kind": {
                "type": "form_submit",
                "custom_id": serde_json::to_string(&form).expect("encode"),
                "fields": { "answer_text": "Fixed the build" }
            }
        });

        let interaction: Interaction = serde_json::from_value(raw).expect("decode");
        match interaction.kind {
            InteractionKind::FormSubmit { form: decoded, fields } => {
                assert_eq!(decoded, form);
                assert_eq!(fields.text(FormField::AnswerText), "Fixed the build");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn reply_wire_shape() {
        let reply = Reply::Message(OutboundMessage::ephemeral("hi"));
        let json = serde_json::to_value(&reply).expect("encode");
        assert_eq!(json["type"], "message");
        assert_eq!(json["data"]["content"], "hi");
        assert_eq!(json["data"]["ephemeral"], true);

        let json = serde_json::to_value(Reply::Deferred).expect("encode");
        assert_eq!(json["type"], "deferred");
    }

    #[tokio::test]
    async fn follow_up_runs_on_finish() {
        let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let seen = flag.clone();
        let response = Response::reply(Reply::Deferred).with_follow_up(async move {
            seen.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        assert_eq!(response.finish().await, Reply::Deferred);
        assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
    }
}
