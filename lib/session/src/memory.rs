//! In-memory session store.

use crate::error::SessionError;
use crate::key::SessionKey;
use crate::state::SessionState;
use crate::store::SessionStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Entry {
    state: SessionState,
    expires_at: Instant,
}

/// Session store held in process memory.
///
/// Expiry is measured on tokio's clock, so tests can drive it with a paused
/// runtime.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Spawns a task that calls `purge_expired` every `every`, so abandoned
    /// conversations do not accumulate.
    pub fn spawn_purge(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(expired_sessions = purged, "Periodic session cleanup");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(
        &self,
        key: &SessionKey,
        state: &SessionState,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        self.entries.lock().await.insert(
            key.storage_key(),
            Entry {
                state: state.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> Result<SessionState, SessionError> {
        let flat = key.storage_key();
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        if entries.get(&flat).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(&flat);
        }

        entries
            .get(&flat)
            .map(|entry| entry.state.clone())
            .ok_or(SessionError::NotFound { key: flat })
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionError> {
        self.entries.lock().await.remove(&key.storage_key());
        Ok(())
    }
}
