//! NATS JetStream key-value session store.
//!
//! Each session is one KV entry holding a JSON envelope. The bucket's
//! `max_age` reclaims abandoned entries; the envelope's own deadline is
//! checked on every read so an entry is never returned past its TTL.

use crate::error::SessionError;
use crate::key::SessionKey;
use crate::state::SessionState;
use crate::store::{DEFAULT_TTL, SessionStore};
use async_nats::jetstream;
use async_nats::jetstream::kv;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bucket name for sessions.
const SESSION_BUCKET_NAME: &str = "huddle-sessions";

/// Configuration for the NATS session store.
#[derive(Debug, Clone)]
pub struct NatsSessionConfig {
    /// NATS server URL.
    pub url: String,
    /// KV bucket name (defaults to huddle-sessions).
    pub bucket_name: Option<String>,
    /// Bucket-wide retention; entries older than this are discarded by the server.
    pub max_age: Duration,
}

impl NatsSessionConfig {
    /// Creates a new config with the given NATS URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bucket_name: None,
            max_age: DEFAULT_TTL,
        }
    }

    fn bucket(&self) -> &str {
        self.bucket_name.as_deref().unwrap_or(SESSION_BUCKET_NAME)
    }
}

/// Stored record: the session plus its absolute deadline.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    expires_at: DateTime<Utc>,
    state: SessionState,
}

impl Envelope {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Session store on a JetStream KV bucket.
pub struct NatsSessionStore {
    kv: kv::Store,
}

impl NatsSessionStore {
    /// Connects to NATS and opens (or creates) the session bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or bucket setup fails.
    pub async fn connect(config: NatsSessionConfig) -> Result<Self, SessionError> {
        let client = async_nats::connect(&config.url).await.map_err(|e| {
            SessionError::ConnectionFailed {
                message: e.to_string(),
            }
        })?;

        let jetstream = jetstream::new(client);
        let kv = Self::ensure_bucket(&jetstream, &config).await?;

        tracing::info!(bucket = config.bucket(), "Opened session bucket");
        Ok(Self { kv })
    }

    /// Opens the bucket, creating it on first use.
    async fn ensure_bucket(
        jetstream: &jetstream::Context,
        config: &NatsSessionConfig,
    ) -> Result<kv::Store, SessionError> {
        if let Ok(store) = jetstream.get_key_value(config.bucket()).await {
            return Ok(store);
        }

        jetstream
            .create_key_value(kv::Config {
                bucket: config.bucket().to_string(),
                description: "In-flight standup and setup conversations".to_string(),
                history: 1,
                max_age: config.max_age,
                ..Default::default()
            })
            .await
            .map_err(|e| SessionError::ConnectionFailed {
                message: format!("failed to create session bucket: {e}"),
            })
    }
}

#[async_trait]
impl SessionStore for NatsSessionStore {
    async fn save(
        &self,
        key: &SessionKey,
        state: &SessionState,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| SessionError::Serialization {
            message: format!("invalid ttl: {e}"),
        })?;
        let envelope = Envelope {
            expires_at: Utc::now() + ttl,
            state: state.clone(),
        };
        let bytes = serde_json::to_vec(&envelope).map_err(|e| SessionError::Serialization {
            message: e.to_string(),
        })?;

        self.kv
            .put(key.storage_key(), bytes.into())
            .await
            .map_err(|e| SessionError::StorageFailed {
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> Result<SessionState, SessionError> {
        let flat = key.storage_key();
        let bytes = self
            .kv
            .get(&flat)
            .await
            .map_err(|e| SessionError::StorageFailed {
                message: e.to_string(),
            })?
            .ok_or_else(|| SessionError::NotFound { key: flat.clone() })?;

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|e| SessionError::Serialization {
                message: e.to_string(),
            })?;

        if !envelope.is_live(Utc::now()) {
            if let Err(e) = self.kv.delete(&flat).await {
                tracing::debug!(key = %flat, error = %e, "Failed to delete expired session");
            }
            return Err(SessionError::NotFound { key: flat });
        }

        Ok(envelope.state)
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionError> {
        self.kv
            .delete(key.storage_key())
            .await
            .map_err(|e| SessionError::StorageFailed {
                message: e.to_string(),
            })
    }
}
