//! Session Store for huddle.
//!
//! Conversations with the bot span several stateless interaction callbacks.
//! The state between them lives here, keyed per participant and
//! conversation kind, and expires after a fixed TTL:
//! - `SessionKey`: report, setup wizard, and pending timezone addressing
//! - `SessionState`: the serialized conversation record
//! - `NatsSessionStore`: JetStream KV implementation
//! - `InMemorySessionStore`: in-process implementation

pub mod error;
pub mod key;
pub mod memory;
pub mod nats;
pub mod state;
pub mod store;

pub use error::SessionError;
pub use key::SessionKey;
pub use memory::InMemorySessionStore;
pub use nats::{NatsSessionConfig, NatsSessionStore};
pub use state::{SessionState, SetupDraft};
pub use store::{DEFAULT_TTL, SessionStore};
