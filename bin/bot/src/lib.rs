//! Huddle bot process.
//!
//! This crate provides:
//! - The inbound interaction endpoint the platform bridge posts to
//! - A messaging gateway that talks back to the bridge over HTTP
//! - Process configuration and startup errors

pub mod bridge;
pub mod config;
pub mod error;
pub mod server;

pub use bridge::HttpGateway;
pub use config::BotConfig;
pub use error::BootError;
pub use server::routes;
