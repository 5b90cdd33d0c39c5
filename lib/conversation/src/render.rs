//! Message, embed, and form builders.
//!
//! Everything the bot shows a participant is assembled here from domain
//! values. Nothing in this module touches a store or the gateway.

use crate::action::{ComponentAction, FormKind};
use crate::form::{Form, FormField, InputStyle, TextInput, truncate};
use crate::gateway::{ButtonStyle, Component, Embed, OutboundMessage, SelectOption};
use chrono::{DateTime, Utc};
use huddle_core::ParticipantId;
use huddle_directory::{HistoryRecord, Participant, Standup, TriggerTime, WEEK, weekday_name};

/// Accent color of report and info embeds.
pub const REPORT_COLOR: u32 = 0x5865F2;
/// Color of skipped-day notices.
pub const SKIPPED_COLOR: u32 = 0x808080;

const MEMBER_LIST_LIMIT: usize = 1000;
const QUESTION_MAX_LENGTH: u16 = 300;

pub const NO_MEMBERSHIP: &str =
    "⛔ You are not part of any standups yet. Please ask your manager to add you.";
pub const NOT_IN_GUILD: &str = "⛔ You are not part of any standups in this specific server.";
pub const NOT_A_MEMBER: &str = "⛔ You are not a member of that standup.";
pub const UTC_NOTE: &str =
    "ℹ️ *Note: Daily reminders are scheduled in UTC. Use `/timezone` to change.*";
pub const NO_DESTINATION_WARNING: &str = "⚠️ This standup has no report channel set. \
     Your answers will be saved but not published.";
pub const REPORT_COMPLETE: &str = "✅ **Standup complete!** Your team has been notified.";
pub const REPORT_SAVED: &str = "✅ **Standup complete!** Your answers have been saved.";
pub const SKIP_CONFIRMED: &str =
    "✅ You have successfully skipped today's standup. Your team has been notified!";
pub const SKIP_SAVED: &str = "✅ You have successfully skipped today's standup.";
pub const INVALID_TIME: &str =
    "Invalid time format. Please use HH:MM in 24h format (e.g., 09:30).";
pub const NOT_MANAGER: &str =
    "Only the manager who created this standup, or a Server Admin, can edit it.";
pub const PROFILE_RESET: &str =
    "✅ **Profile Reset Complete.** You have been removed from all standup teams.";
pub const NO_PROFILE: &str = "No profile found to reset.";

/// Trigger time as the recipient will experience it.
#[must_use]
pub fn format_local_time(time: TriggerTime, timezone: Option<&str>) -> String {
    match timezone {
        Some(tz) => format!("**{time}** ({tz})"),
        None => format!(
            "**{time} (Your Local Time)**\n> ⚠️ *Wait! You haven't set a timezone yet. \
             Run `/timezone` so this triggers at your actual morning!*"
        ),
    }
}

/// The DM that opens a report: notes, then the fill and skip buttons.
/// `offer_timezone` adds a button that opens the timezone menu.
#[must_use]
pub fn report_prompt(standup: &Standup, notes: &[&str], offer_timezone: bool) -> OutboundMessage {
    let mut content = String::new();
    for note in notes {
        content.push_str(note);
        content.push_str("\n\n");
    }
    content.push_str(&format!(
        "Ready to submit your daily **{}** standup?",
        standup.name
    ));

    let mut message = OutboundMessage::text(content).with_components([
        Component::button(
            ComponentAction::FillReport {
                standup: standup.id,
            },
            "Fill Standup",
            ButtonStyle::Primary,
        ),
        Component::button(
            ComponentAction::SkipReport {
                standup: standup.id,
            },
            "⏭️ Skip Today",
            ButtonStyle::Secondary,
        ),
    ]);
    if offer_timezone {
        message = message.with_component(Component::button(
            ComponentAction::SetTimezone {
                standup: standup.id,
            },
            "🌍 Set Timezone",
            ButtonStyle::Secondary,
        ));
    }
    message
}

/// Scheduled-trigger notification preceding the prompt.
#[must_use]
pub fn reminder(standup: &Standup) -> OutboundMessage {
    OutboundMessage::text(format!(
        "⏰ It's time for your **{}** standup!",
        standup.name
    ))
}

/// Form asking question `index`.
#[must_use]
pub fn answer_form(standup: &Standup, index: usize) -> Form {
    let question = standup.label_for(index);
    Form {
        kind: FormKind::ReportAnswer {
            standup: standup.id,
            index,
        },
        title: truncate(
            &format!(
                "{} ({}/{})",
                standup.name,
                index + 1,
                standup.questions.len()
            ),
            45,
        ),
        inputs: vec![TextInput {
            field: FormField::AnswerText,
            label: truncate(question, 45),
            style: InputStyle::Paragraph,
            required: true,
            placeholder: Some(truncate(question, 100)),
            value: None,
            max_length: None,
        }],
    }
}

/// Progress message after answer `index` was stored.
#[must_use]
pub fn answer_saved(standup: &Standup, index: usize) -> OutboundMessage {
    let next = index + 1;
    OutboundMessage::text(format!(
        "✅ **Question {} answered!**\n\nReady for question {}?",
        index + 1,
        next + 1
    ))
    .with_component(Component::button(
        ComponentAction::ContinueReport {
            standup: standup.id,
            index: next,
        },
        format!("Next: Question {}", next + 1),
        ButtonStyle::Primary,
    ))
}

/// Published report: one field per answer.
#[must_use]
pub fn report_embed(
    standup: &Standup,
    participant: &ParticipantId,
    answers: &[String],
    at: DateTime<Utc>,
) -> Embed {
    answers
        .iter()
        .enumerate()
        .fold(
            Embed::new(format!("🚀 {} Update", standup.name), REPORT_COLOR)
                .description(format!("Progress report from {}", participant.mention()))
                .timestamp(at),
            |embed, (i, answer)| embed.field(standup.label_for(i), format!("👉 {answer}"), false),
        )
}

/// Published notice for a skipped day.
#[must_use]
pub fn skipped_embed(standup: &Standup, participant: &ParticipantId, at: DateTime<Utc>) -> Embed {
    Embed::new(format!("⏭️ {} Update (Skipped)", standup.name), SKIPPED_COLOR)
        .description(format!(
            "{} skipped their standup today.",
            participant.mention()
        ))
        .timestamp(at)
}

/// Menu for a participant in several standups.
#[must_use]
pub fn standup_selection(standups: &[Standup]) -> OutboundMessage {
    let options = standups
        .iter()
        .map(|s| {
            SelectOption::new(truncate(&s.name, 100), s.id.get().to_string())
                .description(format!("ID: {}", s.id.get()))
        })
        .collect();

    OutboundMessage::ephemeral("Found multiple standups. Please select one:").with_component(
        Component::select(
            ComponentAction::SelectStandup,
            "Choose a standup...",
            options,
        ),
    )
}

/// Setup wizard form for question `number` (1-based).
#[must_use]
pub fn setup_question_form(number: usize) -> Form {
    Form {
        kind: FormKind::SetupQuestion { number },
        title: format!("Standup Setup (Question {number})"),
        inputs: vec![TextInput {
            field: FormField::QuestionText,
            label: format!("Type Question {number}"),
            style: InputStyle::Short,
            required: true,
            placeholder: Some("e.g., What did you accomplish yesterday?".to_string()),
            value: None,
            max_length: Some(QUESTION_MAX_LENGTH),
        }],
    }
}

/// Setup wizard confirmation after question `number` was stored.
#[must_use]
pub fn setup_question_saved(number: usize, question: &str) -> OutboundMessage {
    let next = number + 1;
    OutboundMessage::ephemeral(format!(
        "✅ **Question {number} saved!**\n> {question}\n\n\
         Do you want to add Question {next}, or finish creating the team?"
    ))
    .with_components([
        Component::button(
            ComponentAction::AddSetupQuestion { number: next },
            format!("➕ Add Question {next}"),
            ButtonStyle::Secondary,
        ),
        Component::button(
            ComponentAction::FinalizeSetup,
            "🚀 Finish & Create",
            ButtonStyle::Success,
        ),
    ])
}

/// Final setup wizard summary.
#[must_use]
pub fn setup_created(
    standup: &Standup,
    manager_timezone: Option<&str>,
    added_members: usize,
) -> OutboundMessage {
    OutboundMessage::ephemeral(format!(
        "🎉 **Standup '{}' created successfully!**\n\
         ⏰ Scheduled for: {} on **{}**\n\
         👥 Added {} questions and {} members.\n\n\
         *💡 Tip: Want to run this on other days? Use the `/edit-standup` command to change the active days!*",
        standup.name,
        format_local_time(standup.trigger_time, manager_timezone),
        standup.active_days,
        standup.questions.len(),
        added_members,
    ))
}

/// DM sent to a newly added member.
#[must_use]
pub fn welcome(standup: &Standup, recipient_timezone: Option<&str>) -> OutboundMessage {
    OutboundMessage::text(format!(
        "👋 **You've been added to the '{}' Standup!**\n\n\
         ⏰ This standup is scheduled for {}\n\n\
         You can now submit your daily reports for this team.\n\
         Run `/start` here or in the server to begin.",
        standup.name,
        format_local_time(standup.trigger_time, recipient_timezone),
    ))
}

/// DM sent to a removed member.
#[must_use]
pub fn removed_notice(standup: &Standup) -> OutboundMessage {
    OutboundMessage::text(format!(
        "ℹ️ You have been removed from the **{}** standup team by the manager.",
        standup.name
    ))
}

fn days_select(standup: &Standup) -> Component {
    let options = WEEK
        .into_iter()
        .map(|day| {
            let name = weekday_name(day);
            SelectOption::new(name, name).selected(standup.active_days.contains(day))
        })
        .collect();

    Component::Select {
        action: ComponentAction::EditDays {
            standup: standup.id,
        },
        placeholder: "Select active days...".to_string(),
        options,
        min_values: 1,
        max_values: 7,
    }
}

fn settings_components(standup: &Standup) -> [Component; 3] {
    [
        days_select(standup),
        Component::button(
            ComponentAction::OpenQuestions {
                standup: standup.id,
            },
            "📝 Edit Questions",
            ButtonStyle::Secondary,
        ),
        Component::button(
            ComponentAction::FinishEditing {
                standup: standup.id,
            },
            "✅ Done",
            ButtonStyle::Success,
        ),
    ]
}

/// Settings dashboard opened by `edit-standup`.
#[must_use]
pub fn edit_dashboard(standup: &Standup, changes: &[String]) -> OutboundMessage {
    let mut content = format!("⚙️ **Managing {}**\n", standup.name);
    if changes.is_empty() {
        content.push_str("ℹ️ No basic settings were changed.\n\n");
    } else {
        content.push_str(&format!(
            "✅ *Saved changes to:*\n- {}\n\n",
            changes.join("\n- ")
        ));
    }
    content.push_str("Use the menu below to change active days, or edit your team's questions!");

    OutboundMessage::ephemeral(content).with_components(settings_components(standup))
}

/// Settings dashboard after the active days changed.
#[must_use]
pub fn days_updated(standup: &Standup) -> OutboundMessage {
    OutboundMessage::ephemeral(format!(
        "✅ Active days for **{}** have been updated to:\n**{}**\n\n\
         Use the menu below to make further changes, or click Done.",
        standup.name, standup.active_days
    ))
    .with_components(settings_components(standup))
}

fn numbered_questions(standup: &Standup) -> String {
    standup
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("**{}.** {q}\n", i + 1))
        .collect()
}

/// Question dashboard listing every question.
#[must_use]
pub fn question_dashboard(standup: &Standup) -> OutboundMessage {
    let options = standup
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            SelectOption::new(format!("Edit Question {}", i + 1), i.to_string())
                .description(truncate(q, 90))
        })
        .collect();

    OutboundMessage::ephemeral(format!(
        "📋 **Managing Questions for {}**\n\n{}\n\
         *💡 To delete a question, select it and completely clear the text box!*",
        standup.name,
        numbered_questions(standup)
    ))
    .with_components([
        Component::select(
            ComponentAction::SelectQuestion {
                standup: standup.id,
            },
            "Select a question to edit or delete...",
            options,
        ),
        Component::button(
            ComponentAction::AddQuestion {
                standup: standup.id,
            },
            "➕ Add New Question",
            ButtonStyle::Primary,
        ),
        Component::button(
            ComponentAction::FinishEditing {
                standup: standup.id,
            },
            "✅ Done",
            ButtonStyle::Success,
        ),
    ])
}

/// Form editing question `index`, prefilled with its text.
#[must_use]
pub fn edit_question_form(standup: &Standup, index: usize) -> Form {
    Form {
        kind: FormKind::EditQuestion {
            standup: standup.id,
            index,
        },
        title: format!("Edit Question {}", index + 1),
        inputs: vec![TextInput {
            field: FormField::QuestionText,
            label: "Question Text (Clear to Delete)".to_string(),
            style: InputStyle::Paragraph,
            required: false,
            placeholder: None,
            value: standup.questions.get(index).cloned(),
            max_length: Some(QUESTION_MAX_LENGTH),
        }],
    }
}

#[must_use]
pub fn add_question_form(standup: &Standup) -> Form {
    Form {
        kind: FormKind::AddQuestion {
            standup: standup.id,
        },
        title: "Add New Question".to_string(),
        inputs: vec![TextInput {
            field: FormField::QuestionText,
            label: "Type your new question".to_string(),
            style: InputStyle::Paragraph,
            required: true,
            placeholder: None,
            value: None,
            max_length: Some(QUESTION_MAX_LENGTH),
        }],
    }
}

#[must_use]
pub fn editing_finished(standup: &Standup) -> OutboundMessage {
    OutboundMessage::ephemeral(format!(
        "✅ **Done!** The settings and questions for **{}** are fully saved and locked in.",
        standup.name
    ))
}

/// Read-only configuration summary.
#[must_use]
pub fn standup_info(standup: &Standup, members: &[Participant]) -> Embed {
    let mentions = members
        .iter()
        .map(|m| m.id.mention())
        .collect::<Vec<_>>()
        .join(" ");
    let member_list = if members.is_empty() {
        "*No members added yet.*".to_string()
    } else if mentions.len() > MEMBER_LIST_LIMIT {
        format!("*{} members (List too long to display)*", members.len())
    } else {
        mentions
    };
    let destination = standup
        .report_channel
        .as_ref()
        .map_or_else(|| "*Not set*".to_string(), |c| c.mention());

    Embed::new(format!("📊 Standup Info: {}", standup.name), REPORT_COLOR)
        .description("Here is the current configuration for this team.")
        .field("👑 Manager", standup.manager_id.mention(), true)
        .field("📢 Report Channel", destination, true)
        .field(
            "⏰ Trigger Time",
            format!("**{}** (Local to each user)", standup.trigger_time),
            true,
        )
        .field("📅 Active Days", standup.active_days.to_string(), false)
        .field(format!("👥 Members ({})", members.len()), member_list, false)
        .field("📝 Questions", numbered_questions(standup), false)
}

/// History view, one embed per record.
#[must_use]
pub fn history(
    participant: &ParticipantId,
    standup: &Standup,
    records: &[HistoryRecord],
    days: i64,
) -> OutboundMessage {
    if records.is_empty() {
        return OutboundMessage::ephemeral(format!(
            "📭 No standup history found for {} in **{}** over the last {days} days.",
            participant.mention(),
            standup.name
        ));
    }

    records.iter().fold(
        OutboundMessage::ephemeral(format!(
            "📜 **Standup History for {} in {}**",
            participant.mention(),
            standup.name
        )),
        |message, record| {
            let embed = record.answers.iter().enumerate().fold(
                Embed::new(
                    format!("📅 Report from {}", record.date.format("%Y-%m-%d")),
                    REPORT_COLOR,
                ),
                |embed, (i, answer)| {
                    embed.field(standup.label_for(i), format!("👉 {answer}"), false)
                },
            );
            message.with_embed(embed)
        },
    )
}

/// Zones offered by the timezone menu: (label, IANA name, offset).
pub const TIMEZONE_CHOICES: [(&str, &str, &str); 4] = [
    ("India (IST)", "Asia/Kolkata", "UTC+5:30"),
    ("US East (EST)", "America/New_York", "UTC-5:00"),
    ("London (GMT)", "Europe/London", "UTC+0:00"),
    ("Singapore (SGT)", "Asia/Singapore", "UTC+8:00"),
];

#[must_use]
pub fn timezone_menu() -> OutboundMessage {
    let options = TIMEZONE_CHOICES
        .iter()
        .map(|(label, zone, offset)| SelectOption::new(*label, *zone).description(*offset))
        .collect();

    OutboundMessage::ephemeral("🌍 Please select your timezone to receive reminders at the right time:")
        .with_component(Component::select(
            ComponentAction::SelectTimezone,
            "Select your local timezone",
            options,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use huddle_core::{ChannelId, GuildId, HistoryId, StandupId};
    use huddle_directory::{ActiveDays, HistoryOutcome};

    fn standup() -> Standup {
        Standup {
            id: StandupId::new(3),
            guild_id: GuildId::new("g"),
            name: "Platform".to_string(),
            manager_id: ParticipantId::new("m"),
            report_channel: Some(ChannelId::new("c")),
            questions: vec!["Yesterday?".to_string(), "Today?".to_string()],
            trigger_time: TriggerTime::default(),
            active_days: ActiveDays::BUSINESS,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn local_time_with_and_without_zone() {
        let time = TriggerTime::new(9, 30).expect("valid");
        assert_eq!(
            format_local_time(time, Some("Asia/Kolkata")),
            "**09:30** (Asia/Kolkata)"
        );
        assert!(format_local_time(time, None).contains("haven't set a timezone"));
    }

    #[test]
    fn prompt_carries_notes_and_buttons() {
        let message = report_prompt(&standup(), &[UTC_NOTE], false);
        assert!(message.content.starts_with(UTC_NOTE));
        let actions: Vec<_> = message.components.iter().map(Component::action).collect();
        assert_eq!(
            actions,
            vec![
                ComponentAction::FillReport {
                    standup: StandupId::new(3)
                },
                ComponentAction::SkipReport {
                    standup: StandupId::new(3)
                },
            ]
        );
    }

    #[test]
    fn prompt_offers_timezone_button_on_fallback() {
        let message = report_prompt(&standup(), &[UTC_NOTE], true);
        assert_eq!(message.components.len(), 3);
        assert_eq!(
            message.components[2].action(),
            ComponentAction::SetTimezone {
                standup: StandupId::new(3)
            }
        );
    }

    #[test]
    fn report_embed_labels_extra_answers() {
        let answers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let embed = report_embed(&standup(), &ParticipantId::new("u"), &answers, Utc::now());
        let names: Vec<_> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Yesterday?", "Today?", "Update"]);
        assert_eq!(embed.fields[0].value, "👉 a");
        assert_eq!(embed.description.as_deref(), Some("Progress report from <@u>"));
    }

    #[test]
    fn answer_form_truncates_long_questions() {
        let mut s = standup();
        s.questions[0] = "q".repeat(120);
        let form = answer_form(&s, 0);
        assert_eq!(form.inputs[0].label.chars().count(), 45);
        assert_eq!(
            form.inputs[0].placeholder.as_ref().map(|p| p.chars().count()),
            Some(100)
        );
        assert_eq!(form.title, "Platform (1/2)");
    }

    #[test]
    fn days_select_marks_active_days() {
        let message = edit_dashboard(&standup(), &[]);
        match &message.components[0] {
            Component::Select {
                options,
                min_values,
                max_values,
                ..
            } => {
                let selected: Vec<_> = options
                    .iter()
                    .filter(|o| o.default)
                    .map(|o| o.value.as_str())
                    .collect();
                assert_eq!(
                    selected,
                    vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
                );
                assert_eq!((*min_values, *max_values), (1, 7));
            }
            other => panic!("expected select, got {other:?}"),
        }
        assert!(message.content.contains("No basic settings were changed"));
    }

    #[test]
    fn info_collapses_long_member_lists() {
        let members: Vec<Participant> = (0..100)
            .map(|i| Participant::new(ParticipantId::new(format!("1234567890{i:03}"))))
            .collect();
        let embed = standup_info(&standup(), &members);
        let field = embed
            .fields
            .iter()
            .find(|f| f.name == "👥 Members (100)")
            .expect("members field");
        assert_eq!(field.value, "*100 members (List too long to display)*");
    }

    #[test]
    fn history_renders_one_embed_per_record() {
        let record = HistoryRecord {
            id: HistoryId::new(1),
            participant: ParticipantId::new("u"),
            standup: StandupId::new(3),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).expect("date"),
            answers: vec!["shipped".to_string()],
            outcome: HistoryOutcome::Submitted,
            created_at: Utc::now(),
        };
        let message = history(&ParticipantId::new("u"), &standup(), &[record], 5);
        assert_eq!(message.embeds.len(), 1);
        assert_eq!(message.embeds[0].title, "📅 Report from 2024-06-03");

        let empty = history(&ParticipantId::new("u"), &standup(), &[], 5);
        assert!(empty.content.starts_with("📭"));
    }

    #[test]
    fn timezone_menu_lists_fixed_zones() {
        let message = timezone_menu();
        match &message.components[0] {
            Component::Select { options, .. } => {
                assert_eq!(options.len(), 4);
                assert_eq!(options[0].value, "Asia/Kolkata");
            }
            other => panic!("expected select, got {other:?}"),
        }
    }
}
