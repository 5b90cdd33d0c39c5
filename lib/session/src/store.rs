//! Session store contract.

use crate::error::SessionError;
use crate::key::SessionKey;
use crate::state::SessionState;
use async_trait::async_trait;
use std::time::Duration;

/// Default lifetime of an unfinished conversation.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Ephemeral per-conversation state with expiry.
///
/// A `get` after the TTL has elapsed returns `SessionError::NotFound`, never
/// stale data. Concurrent writers to the same key are last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores the state, replacing any previous value and restarting the TTL.
    async fn save(
        &self,
        key: &SessionKey,
        state: &SessionState,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    /// Gets the live state under a key.
    async fn get(&self, key: &SessionKey) -> Result<SessionState, SessionError>;

    /// Removes the state under a key. Deleting a missing key succeeds.
    async fn delete(&self, key: &SessionKey) -> Result<(), SessionError>;
}
