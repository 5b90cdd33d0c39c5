//! Conversation layer for huddle.
//!
//! This crate provides:
//!
//! - **Flow Controller**: report submission, team-setup wizard, and the
//!   settings and question dashboards
//! - **Gateway Contract**: typed inbound interactions and outbound replies
//! - **Command Registry**: the command surface, built once at startup
//! - **Interaction Router**: exhaustive dispatch of typed actions and forms

pub mod action;
mod admin;
pub mod commands;
pub mod controller;
mod dashboard;
pub mod error;
pub mod flow;
pub mod form;
pub mod gateway;
pub mod render;
pub mod router;
pub mod setup;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
mod timezone;

pub use action::{ComponentAction, FormKind};
pub use admin::{DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS, history_window};
pub use commands::{
    Command, CommandCategory, CommandInvocation, CommandOption, CommandRegistry, CommandSpec,
    OptionKind, OptionValue,
};
pub use controller::{Clock, FALLBACK_ZONE, FlowController, zone};
pub use dashboard::SettingsChange;
pub use error::{FlowError, GatewayError};
pub use flow::StartOutcome;
pub use form::{Form, FormField, FormValues, InputStyle, TextInput};
pub use gateway::{
    AutocompleteRequest, ButtonStyle, Choice, Component, Embed, EmbedField, Interaction,
    InteractionKind, InteractionToken, Invoker, MessagingGateway, OutboundMessage, Reply, Response,
    SelectOption,
};
pub use router::InteractionRouter;
pub use setup::{SetupRequest, parse_mentions};
