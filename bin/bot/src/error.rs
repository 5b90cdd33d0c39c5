//! Startup errors for the bot process.

use std::fmt;

/// Errors that stop the process from coming up.
#[derive(Debug)]
pub enum BootError {
    /// Configuration is missing or invalid.
    Config { details: String },
    /// The database could not be reached.
    Database { details: String },
    /// Schema migrations failed.
    Migration { details: String },
    /// The session store could not be opened.
    Sessions { details: String },
    /// Commands could not be published through the bridge.
    Commands { details: String },
    /// The listener could not be bound.
    Bind { addr: String, details: String },
    /// The HTTP server stopped with an error.
    Serve { details: String },
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Database { details } => write!(f, "database connection failed: {details}"),
            Self::Migration { details } => write!(f, "database migration failed: {details}"),
            Self::Sessions { details } => write!(f, "session store unavailable: {details}"),
            Self::Commands { details } => write!(f, "command registration failed: {details}"),
            Self::Bind { addr, details } => write!(f, "failed to bind {addr}: {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for BootError {}
