//! Process configuration.
//!
//! Loaded via the `config` crate from environment variables; nested keys use
//! `__` as the separator (`SESSION__TTL_HOURS`, `SCHEDULER__TICK_SECONDS`).

use serde::Deserialize;
use std::time::Duration;

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// PostgreSQL URL. Without one the directory lives in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// NATS URL. Without one sessions live in memory.
    #[serde(default)]
    pub nats_url: Option<String>,

    /// Base URL of the chat-platform bridge.
    pub bridge_url: String,

    /// Address of the inbound interaction endpoint.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

/// Session store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// JetStream KV bucket holding sessions.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// How often the in-memory store drops expired sessions.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

/// Trigger loop settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_ttl_hours() -> u64 {
    huddle_session::DEFAULT_TTL.as_secs() / 3600
}

fn default_bucket() -> String {
    "huddle-sessions".to_string()
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_tick_seconds() -> u64 {
    huddle_scheduler::DEFAULT_TICK.as_secs()
}

fn default_enabled() -> bool {
    true
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            bucket: default_bucket(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            enabled: default_enabled(),
        }
    }
}

impl SessionSettings {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 60 * 60)
    }

    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

impl SchedulerSettings {
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_seconds.max(1))
    }
}

impl BotConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `BRIDGE_URL` is missing or a value does not parse.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
