//! Strongly-typed ID types for domain entities.
//!
//! Two families of identifiers exist:
//!
//! - **Numeric IDs** are assigned by the Directory Store (e.g. a standup's
//!   serial key). They travel inside interaction payloads as plain integers.
//! - **External IDs** are assigned by the chat platform (users, guilds,
//!   channels). They are opaque strings and are never generated locally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed wrapper around a store-assigned integer key.
macro_rules! define_numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw key.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns the prefix used for display formatting.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let prefix_with_underscore = concat!($prefix, "_");
                let raw = s.strip_prefix(prefix_with_underscore).unwrap_or(s);

                raw.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Macro to generate a strongly-typed wrapper around a platform-assigned identity.
macro_rules! define_external_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a platform identity.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the identity as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "empty identity".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

define_numeric_id!(
    /// Unique identifier for a standup definition.
    StandupId,
    "standup"
);

define_numeric_id!(
    /// Unique identifier for a history record.
    HistoryId,
    "hist"
);

define_external_id!(
    /// Platform identity of a participant (a chat user).
    ParticipantId
);

define_external_id!(
    /// Platform identity of a guild (the owning team/server).
    GuildId
);

define_external_id!(
    /// Platform identity of a channel, including direct-message channels.
    ChannelId
);

impl ParticipantId {
    /// Renders the identity as a platform mention.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl ChannelId {
    /// Renders the identity as a platform channel link.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<#{}>", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standup_id_display_format() {
        let id = StandupId::new(42);
        assert_eq!(id.to_string(), "standup_42");
    }

    #[test]
    fn parse_with_prefix() {
        let id = StandupId::new(7);
        let parsed: StandupId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_without_prefix() {
        let id: StandupId = "19".parse().expect("should parse");
        assert_eq!(id.get(), 19);
    }

    #[test]
    fn parse_invalid_numeric() {
        let result: Result<StandupId, _> = "standup_abc".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "StandupId");
    }

    #[test]
    fn external_id_rejects_empty() {
        let result: Result<ParticipantId, _> = "   ".parse();
        assert!(result.is_err());
    }

    #[test]
    fn mentions() {
        assert_eq!(ParticipantId::new("123").mention(), "<@123>");
        assert_eq!(ChannelId::new("456").mention(), "<#456>");
    }

    #[test]
    fn id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(ParticipantId::new("1"));
        set.insert(ParticipantId::new("2"));
        set.insert(ParticipantId::new("1"));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_serde_is_transparent() {
        let json = serde_json::to_string(&StandupId::new(5)).expect("serialize");
        assert_eq!(json, "5");
        let json = serde_json::to_string(&GuildId::new("99")).expect("serialize");
        assert_eq!(json, "\"99\"");
    }
}
