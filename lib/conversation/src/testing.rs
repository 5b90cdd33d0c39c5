//! In-process gateway that records outbound traffic.

use crate::commands::CommandRegistry;
use crate::error::GatewayError;
use crate::gateway::{InteractionToken, MessagingGateway, OutboundMessage};
use async_trait::async_trait;
use huddle_core::{ChannelId, ParticipantId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Direct {
        recipient: ParticipantId,
        message: OutboundMessage,
    },
    Channel {
        channel: ChannelId,
        message: OutboundMessage,
    },
    Edited {
        token: InteractionToken,
        message: OutboundMessage,
    },
}

/// Gateway double for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    sent: Arc<Mutex<Vec<Sent>>>,
    registered: Arc<Mutex<Vec<String>>>,
    unreachable: Arc<Mutex<HashSet<ParticipantId>>>,
}

impl RecordingGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes direct messages to this participant fail.
    pub async fn make_unreachable(&self, participant: ParticipantId) {
        self.unreachable.lock().await.insert(participant);
    }

    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    /// Direct messages delivered to a participant, oldest first.
    pub async fn direct_to(&self, participant: &ParticipantId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Direct { recipient, message } if recipient == participant => {
                    Some(message.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub async fn channel_posts(&self, target: &ChannelId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Channel { channel, message } if channel == target => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn edits(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Edited { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of the commands published through `register_commands`.
    pub async fn registered(&self) -> Vec<String> {
        self.registered.lock().await.clone()
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn register_commands(&self, registry: &CommandRegistry) -> Result<(), GatewayError> {
        let mut registered = self.registered.lock().await;
        registered.clear();
        registered.extend(registry.all().map(|c| c.name.clone()));
        Ok(())
    }

    async fn send_direct(
        &self,
        recipient: &ParticipantId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        if self.unreachable.lock().await.contains(recipient) {
            return Err(GatewayError::Rejected {
                status: 403,
                message: "cannot send messages to this user".to_string(),
            });
        }
        self.sent.lock().await.push(Sent::Direct {
            recipient: recipient.clone(),
            message,
        });
        Ok(())
    }

    async fn send_channel(
        &self,
        channel: &ChannelId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.sent.lock().await.push(Sent::Channel {
            channel: channel.clone(),
            message,
        });
        Ok(())
    }

    async fn edit_reply(
        &self,
        token: &InteractionToken,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.sent.lock().await.push(Sent::Edited {
            token: token.clone(),
            message,
        });
        Ok(())
    }
}
