//! Command registry and typed command invocations.
//!
//! The registry is an explicit value built once at startup, published to the
//! platform through `MessagingGateway::register_commands`, and handed to the
//! router. Invocations are parsed into `Command` before any handler runs.

use crate::error::FlowError;
use huddle_core::{ChannelId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Option name shared by every command that targets a standup by name.
pub const STANDUP_OPTION: &str = "standup_name";

/// Type of a command option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Integer,
    User,
    Channel,
}

/// One parameter of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    /// Values are suggested by the bot while typing.
    pub autocomplete: bool,
}

impl CommandOption {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            autocomplete: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }
}

/// Who a command is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Participant,
    Manager,
}

/// Definition of a registered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
    pub category: CommandCategory,
    /// Restricted to guild administrators at the platform level.
    pub admin_only: bool,
}

impl CommandSpec {
    /// Creates a participant command with no options.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            category: CommandCategory::Participant,
            admin_only: false,
        }
    }

    #[must_use]
    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Marks this as a manager command.
    #[must_use]
    pub fn for_managers(mut self) -> Self {
        self.category = CommandCategory::Manager;
        self
    }

    #[must_use]
    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// The bot's command surface, in registration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
}

impl CommandRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The full huddle command set.
    #[must_use]
    pub fn standard() -> Self {
        let standup = |description: &str| {
            CommandOption::new(STANDUP_OPTION, description, OptionKind::String)
                .required()
                .autocomplete()
        };

        let mut registry = Self::new();
        registry.register(
            CommandSpec::new("start", "Manually trigger your daily standup form").with_option(
                CommandOption::new(STANDUP_OPTION, "Which standup to fill", OptionKind::String)
                    .autocomplete(),
            ),
        );
        registry.register(
            CommandSpec::new("history", "View past standup reports")
                .with_option(
                    CommandOption::new("user", "Whose history to view", OptionKind::User)
                        .required(),
                )
                .with_option(standup("The standup team"))
                .with_option(CommandOption::new(
                    "days",
                    "How many days back to look (max 10)",
                    OptionKind::Integer,
                )),
        );
        registry.register(CommandSpec::new(
            "timezone",
            "Set your local timezone for standup reminders",
        ));
        registry.register(CommandSpec::new(
            "delete-my-data",
            "Permanently delete your profile and leave all standups",
        ));
        registry.register(CommandSpec::new("help", "Show the help menu"));
        registry.register(
            CommandSpec::new("create-standup", "Create a new team standup")
                .for_managers()
                .admin_only()
                .with_option(
                    CommandOption::new("name", "Name of the standup team", OptionKind::String)
                        .required(),
                )
                .with_option(
                    CommandOption::new("channel", "Where reports are posted", OptionKind::Channel)
                        .required(),
                )
                .with_option(
                    CommandOption::new(
                        "members",
                        "Mention the members, e.g. @alice @bob",
                        OptionKind::String,
                    )
                    .required(),
                )
                .with_option(CommandOption::new(
                    "time",
                    "Trigger time in HH:MM, 24h (default 09:00)",
                    OptionKind::String,
                )),
        );
        registry.register(
            CommandSpec::new("edit-standup", "Edit an existing standup team's settings")
                .for_managers()
                .with_option(standup("The standup to edit"))
                .with_option(CommandOption::new(
                    "new_channel",
                    "New report channel",
                    OptionKind::Channel,
                ))
                .with_option(CommandOption::new(
                    "new_time",
                    "New trigger time in HH:MM, 24h",
                    OptionKind::String,
                )),
        );
        registry.register(
            CommandSpec::new("delete-standup", "Permanently delete an existing standup team")
                .for_managers()
                .with_option(standup("The standup to delete")),
        );
        registry.register(
            CommandSpec::new("add-member", "Add a user to an existing standup")
                .for_managers()
                .with_option(CommandOption::new("user", "Who to add", OptionKind::User).required())
                .with_option(standup("The standup team")),
        );
        registry.register(
            CommandSpec::new("remove-member", "Remove a user from an existing standup")
                .for_managers()
                .with_option(
                    CommandOption::new("user", "Who to remove", OptionKind::User).required(),
                )
                .with_option(standup("The standup team")),
        );
        registry.register(
            CommandSpec::new("standup-info", "Show a standup team's configuration")
                .for_managers()
                .with_option(standup("The standup team")),
        );
        registry
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, spec: CommandSpec) {
        self.commands.retain(|c| c.name != spec.name);
        self.commands.push(spec);
    }

    /// Gets a command by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Returns all commands in registration order.
    pub fn all(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter()
    }

    pub fn by_category(&self, category: CommandCategory) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter().filter(move |c| c.category == category)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns true if the option of a command is autocompleted.
    #[must_use]
    pub fn is_autocompleted(&self, command: &str, option: &str) -> bool {
        self.get(command)
            .and_then(|c| c.option(option))
            .is_some_and(|o| o.autocomplete)
    }

    /// The help menu listing every command.
    #[must_use]
    pub fn help_text(&self) -> String {
        let section = |category| {
            self.by_category(category)
                .map(|c| format!("`/{}` - {}.\n", c.name, c.description))
                .collect::<String>()
        };

        format!(
            "💡 **Huddle Help Menu**\n\n\
             **👤 User Commands**\n{}\n\
             **🛠️ Manager Commands**\n{}\n\
             ℹ️ *Note: I will automatically ping you at your standup's scheduled time in your saved timezone!*",
            section(CommandCategory::Participant),
            section(CommandCategory::Manager),
        )
    }
}

/// A raw option value as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Integer(i64),
    /// Strings, and user or channel identities.
    Text(String),
}

/// A command as invoked by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub name: String,
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

impl CommandInvocation {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .insert(name.into(), OptionValue::Text(value.into()));
        self
    }

    #[must_use]
    pub fn with_integer(mut self, name: impl Into<String>, value: i64) -> Self {
        self.options.insert(name.into(), OptionValue::Integer(value));
        self
    }

    fn text(&self, name: &str) -> Option<String> {
        match self.options.get(name) {
            Some(OptionValue::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(OptionValue::Integer(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn required_text(&self, name: &str) -> Result<String, FlowError> {
        self.text(name)
            .ok_or_else(|| FlowError::validation(format!("Missing required option `{name}`.")))
    }

    fn integer(&self, name: &str) -> Result<Option<i64>, FlowError> {
        match self.options.get(name) {
            None => Ok(None),
            Some(OptionValue::Integer(n)) => Ok(Some(*n)),
            Some(OptionValue::Text(s)) => s.trim().parse().map(Some).map_err(|_| {
                FlowError::validation(format!("Option `{name}` must be a whole number."))
            }),
        }
    }
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start {
        standup: Option<String>,
    },
    CreateStandup {
        name: String,
        channel: Option<ChannelId>,
        members: String,
        time: Option<String>,
    },
    EditStandup {
        standup: String,
        new_channel: Option<ChannelId>,
        new_time: Option<String>,
    },
    DeleteStandup {
        standup: String,
    },
    AddMember {
        user: ParticipantId,
        standup: String,
    },
    RemoveMember {
        user: ParticipantId,
        standup: String,
    },
    StandupInfo {
        standup: String,
    },
    History {
        user: ParticipantId,
        standup: String,
        days: Option<i64>,
    },
    Timezone,
    Help,
    DeleteMyData,
}

impl Command {
    /// Parses an invocation into a typed command.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown command and `Validation` for a
    /// missing or malformed option.
    pub fn parse(invocation: &CommandInvocation) -> Result<Self, FlowError> {
        let i = invocation;
        let command = match i.name.as_str() {
            "start" => Self::Start {
                standup: i.text(STANDUP_OPTION),
            },
            "create-standup" => Self::CreateStandup {
                name: i.required_text("name")?,
                channel: i.text("channel").map(ChannelId::new),
                members: i.text("members").unwrap_or_default(),
                time: i.text("time"),
            },
            "edit-standup" => Self::EditStandup {
                standup: i.required_text(STANDUP_OPTION)?,
                new_channel: i.text("new_channel").map(ChannelId::new),
                new_time: i.text("new_time"),
            },
            "delete-standup" => Self::DeleteStandup {
                standup: i.required_text(STANDUP_OPTION)?,
            },
            "add-member" => Self::AddMember {
                user: ParticipantId::new(i.required_text("user")?),
                standup: i.required_text(STANDUP_OPTION)?,
            },
            "remove-member" => Self::RemoveMember {
                user: ParticipantId::new(i.required_text("user")?),
                standup: i.required_text(STANDUP_OPTION)?,
            },
            "standup-info" => Self::StandupInfo {
                standup: i.required_text(STANDUP_OPTION)?,
            },
            "history" => Self::History {
                user: ParticipantId::new(i.required_text("user")?),
                standup: i.required_text(STANDUP_OPTION)?,
                days: i.integer("days")?,
            },
            "timezone" => Self::Timezone,
            "help" => Self::Help,
            "delete-my-data" => Self::DeleteMyData,
            other => {
                return Err(FlowError::not_found(format!("Unknown command `/{other}`.")));
            }
        };
        Ok(command)
    }
}
