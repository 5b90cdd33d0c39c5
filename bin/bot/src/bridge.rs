//! Messaging gateway over the chat-platform bridge's HTTP API.
//!
//! The bridge owns the platform connection. This client only calls:
//!
//! - `PUT  {base}/commands` with the command registry
//! - `POST {base}/users/{id}/messages` for direct messages
//! - `POST {base}/channels/{id}/messages` for channel posts
//! - `PATCH {base}/interactions/{token}/reply` to edit a deferred reply

use async_trait::async_trait;
use huddle_conversation::{
    CommandRegistry, GatewayError, InteractionToken, MessagingGateway, OutboundMessage,
};
use huddle_core::{ChannelId, ParticipantId};
use reqwest::Method;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the bridge.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Creates a gateway for the bridge at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn call<T: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::SendFailed {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MessagingGateway for HttpGateway {
    async fn register_commands(&self, registry: &CommandRegistry) -> Result<(), GatewayError> {
        self.call(Method::PUT, "commands", registry).await?;
        tracing::info!(commands = registry.len(), "Registered commands");
        Ok(())
    }

    async fn send_direct(
        &self,
        recipient: &ParticipantId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.call(
            Method::POST,
            &format!("users/{}/messages", recipient.as_str()),
            &message,
        )
        .await
    }

    async fn send_channel(
        &self,
        channel: &ChannelId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.call(
            Method::POST,
            &format!("channels/{}/messages", channel.as_str()),
            &message,
        )
        .await
    }

    async fn edit_reply(
        &self,
        token: &InteractionToken,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.call(
            Method::PATCH,
            &format!("interactions/{}/reply", token.as_str()),
            &message,
        )
        .await
    }
}
