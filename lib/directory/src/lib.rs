//! Directory Store and History Ledger for huddle.
//!
//! This crate provides:
//! - The standup, participant profile, and history data model
//! - `DirectoryStore` and `HistoryLedger` storage contracts
//! - A PostgreSQL implementation (`PgDirectory`) with bundled migrations
//! - An in-memory implementation (`InMemoryDirectory`)

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{DirectoryError, ValidationError};
pub use memory::InMemoryDirectory;
pub use model::{
    ActiveDays, HistoryOutcome, HistoryRecord, NewHistoryRecord, NewStandup, Participant,
    ProfileLifecycle, SKIPPED_SENTINEL, Standup, StandupQuery, StandupRoster, TriggerTime, WEEK,
    weekday_name,
};
pub use postgres::PgDirectory;
pub use store::{DirectoryStore, HistoryLedger};
