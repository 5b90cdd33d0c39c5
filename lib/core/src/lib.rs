//! Core domain types and utilities for huddle.
//!
//! This crate provides the identifier types shared by every huddle crate, and
//! the rootcause `Result` alias the bot process returns from startup.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ChannelId, GuildId, HistoryId, ParseIdError, ParticipantId, StandupId};
