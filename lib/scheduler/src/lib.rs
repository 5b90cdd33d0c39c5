//! Trigger engine for scheduled standups.
//!
//! This crate provides:
//!
//! - **Due Evaluation**: exact-minute matching of a standup's trigger time in
//!   each participant's own timezone
//! - **Trigger Engine**: the periodic scan that reminds participants and
//!   starts their report flow

pub mod engine;
pub mod error;
pub mod trigger;

pub use engine::{DEFAULT_TICK, FlowLauncher, TickReport, TriggerEngine};
pub use error::ScheduleError;
pub use trigger::due;
