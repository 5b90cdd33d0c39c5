//! End-to-end conversations driven through the interaction router.

use chrono::{TimeZone, Utc};
use huddle_conversation::testing::RecordingGateway;
use huddle_conversation::{
    CommandInvocation, CommandRegistry, Component, ComponentAction, FlowController, FormField,
    FormKind, FormValues, Interaction, InteractionKind, InteractionRouter, InteractionToken,
    Invoker, Reply, render,
};
use huddle_core::{ChannelId, GuildId, ParticipantId};
use huddle_directory::{
    ActiveDays, DirectoryStore, HistoryLedger, HistoryOutcome, InMemoryDirectory, NewStandup,
    Participant, Standup, StandupQuery, TriggerTime,
};
use huddle_session::{InMemorySessionStore, SessionKey, SessionStore};
use std::sync::Arc;

struct Harness {
    router: InteractionRouter,
    directory: InMemoryDirectory,
    sessions: InMemorySessionStore,
    gateway: RecordingGateway,
}

fn harness() -> Harness {
    let directory = InMemoryDirectory::new();
    let sessions = InMemorySessionStore::new();
    let gateway = RecordingGateway::new();
    let now = Utc.with_ymd_and_hms(2024, 6, 4, 9, 0, 0).unwrap();
    let controller = FlowController::new(
        Arc::new(directory.clone()),
        Arc::new(directory.clone()),
        Arc::new(sessions.clone()),
        Arc::new(gateway.clone()),
    )
    .with_clock(Arc::new(move || now));
    Harness {
        router: InteractionRouter::new(controller, Arc::new(CommandRegistry::standard())),
        directory,
        sessions,
        gateway,
    }
}

impl Harness {
    async fn standup(&self, name: &str, manager: &str, members: &[&str]) -> Standup {
        self.directory
            .create_standup(NewStandup {
                guild_id: GuildId::new("guild"),
                name: name.to_string(),
                manager_id: ParticipantId::new(manager),
                report_channel: Some(ChannelId::new("reports")),
                questions: vec!["Yesterday?".to_string(), "Today?".to_string()],
                trigger_time: TriggerTime::default(),
                active_days: ActiveDays::ALL,
                members: members.iter().map(|m| ParticipantId::new(*m)).collect(),
            })
            .await
            .expect("create standup")
    }

    async fn send(&self, participant: &str, is_admin: bool, kind: InteractionKind) -> Reply {
        self.router
            .handle(Interaction {
                token: InteractionToken::new(format!("token-{participant}")),
                invoker: Invoker {
                    participant: ParticipantId::new(participant),
                    guild: Some(GuildId::new("guild")),
                    channel: Some(ChannelId::new("general")),
                    is_admin,
                },
                kind,
            })
            .await
            .finish()
            .await
    }

    async fn click(&self, participant: &str, action: ComponentAction, values: &[&str]) -> Reply {
        self.send(
            participant,
            false,
            InteractionKind::Component {
                action,
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
        .await
    }
}

fn answer(text: &str) -> FormValues {
    FormValues::new().with(FormField::AnswerText, text)
}

#[tokio::test]
async fn two_memberships_offer_a_selection_of_exactly_two() {
    let h = harness();
    let first = h.standup("Backend", "boss", &["alice"]).await;
    let second = h.standup("Frontend", "boss", &["alice"]).await;

    let reply = h
        .send(
            "alice",
            false,
            InteractionKind::Command(CommandInvocation::new("start")),
        )
        .await;
    let Reply::Message(menu) = reply else {
        panic!("expected a selection message, got {reply:?}");
    };
    let Some(Component::Select { options, .. }) = menu.components.first() else {
        panic!("expected a select menu");
    };
    assert_eq!(options.len(), 2);
    assert!(
        h.sessions
            .get(&SessionKey::report(ParticipantId::new("alice"), first.id))
            .await
            .is_err()
    );

    let chosen = second.id.get().to_string();
    h.click("alice", ComponentAction::SelectStandup, &[chosen.as_str()])
        .await;

    let alice = ParticipantId::new("alice");
    let session = h
        .sessions
        .get(&SessionKey::report(alice.clone(), second.id))
        .await
        .expect("session for the chosen standup");
    assert_eq!(session.step, 0);
    assert!(
        h.sessions
            .get(&SessionKey::report(alice.clone(), first.id))
            .await
            .is_err()
    );
    assert_eq!(h.gateway.direct_to(&alice).await.len(), 1);
}

#[tokio::test]
async fn setup_wizard_creates_standup_and_welcomes_members() {
    let h = harness();

    let reply = h
        .send(
            "100",
            true,
            InteractionKind::Command(
                CommandInvocation::new("create-standup")
                    .with_text("name", "Platform")
                    .with_text("channel", "reports")
                    .with_text("members", "<@200> <@!300>")
                    .with_text("time", "9:30"),
            ),
        )
        .await;
    assert!(matches!(reply, Reply::Form(_)));

    for (number, question) in [(1, "Yesterday?"), (2, "Today?"), (3, "Blockers?")] {
        let reply = h
            .send(
                "100",
                true,
                InteractionKind::FormSubmit {
                    form: FormKind::SetupQuestion { number },
                    fields: FormValues::new().with(FormField::QuestionText, question),
                },
            )
            .await;
        assert!(matches!(reply, Reply::Message(_) | Reply::Update(_)));
    }

    let reply = h
        .send(
            "100",
            true,
            InteractionKind::Component {
                action: ComponentAction::FinalizeSetup,
                values: Vec::new(),
            },
        )
        .await;
    assert_eq!(reply, Reply::Deferred);

    let standups = h
        .directory
        .search_standups(&StandupQuery::in_guild(GuildId::new("guild")))
        .await
        .expect("search");
    assert_eq!(standups.len(), 1);
    let standup = &standups[0];
    assert_eq!(standup.questions.len(), 3);
    assert_eq!(standup.trigger_time.to_string(), "09:30");

    let mut members: Vec<String> = h
        .directory
        .members(standup.id)
        .await
        .expect("members")
        .into_iter()
        .map(|p| p.id.to_string())
        .collect();
    members.sort();
    assert_eq!(members, vec!["100", "200", "300"]);

    for invited in ["200", "300"] {
        let welcomes = h.gateway.direct_to(&ParticipantId::new(invited)).await;
        assert_eq!(welcomes.len(), 1, "welcome for {invited}");
        assert!(welcomes[0].content.contains("Platform"));
    }
    assert!(h.gateway.direct_to(&ParticipantId::new("100")).await.is_empty());
    assert_eq!(h.gateway.edits().await.len(), 1);
    assert!(
        h.sessions
            .get(&SessionKey::setup(ParticipantId::new("100")))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn timezone_is_inherited_from_manager_before_first_question() {
    let h = harness();
    let mut manager = Participant::new(ParticipantId::new("boss"));
    manager.timezone = Some("Europe/London".to_string());
    h.directory
        .save_participant(&manager)
        .await
        .expect("save manager");
    h.standup("Backend", "boss", &["alice"]).await;

    h.send(
        "alice",
        false,
        InteractionKind::Command(CommandInvocation::new("start")),
    )
    .await;

    let profile = h
        .directory
        .get_participant(&ParticipantId::new("alice"))
        .await
        .expect("get")
        .expect("profile");
    assert_eq!(profile.timezone(), Some("Europe/London"));

    let prompts = h.gateway.direct_to(&ParticipantId::new("alice")).await;
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].content.contains(render::UTC_NOTE));
}

#[tokio::test]
async fn completing_a_report_writes_exactly_one_record() {
    let h = harness();
    let standup = h.standup("Backend", "boss", &["alice"]).await;
    let alice = ParticipantId::new("alice");

    h.send(
        "alice",
        false,
        InteractionKind::Command(CommandInvocation::new("start")),
    )
    .await;
    let reply = h
        .click("alice", ComponentAction::FillReport { standup: standup.id }, &[])
        .await;
    assert!(matches!(reply, Reply::Form(_)));

    h.send(
        "alice",
        false,
        InteractionKind::FormSubmit {
            form: FormKind::ReportAnswer {
                standup: standup.id,
                index: 0,
            },
            fields: answer("Shipped the parser"),
        },
    )
    .await;
    h.click(
        "alice",
        ComponentAction::ContinueReport {
            standup: standup.id,
            index: 1,
        },
        &[],
    )
    .await;
    let reply = h
        .send(
            "alice",
            false,
            InteractionKind::FormSubmit {
                form: FormKind::ReportAnswer {
                    standup: standup.id,
                    index: 1,
                },
                fields: answer("Reviews"),
            },
        )
        .await;
    assert!(matches!(reply, Reply::Update(ref m) if m.content == render::REPORT_COMPLETE));

    // A replayed final submission finds no session.
    let replay = h
        .send(
            "alice",
            false,
            InteractionKind::FormSubmit {
                form: FormKind::ReportAnswer {
                    standup: standup.id,
                    index: 1,
                },
                fields: answer("Reviews"),
            },
        )
        .await;
    assert!(matches!(replay, Reply::Message(ref m) if m.ephemeral));

    let day = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
    let records = h.directory.query(&alice, standup.id, day).await.expect("query");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, HistoryOutcome::Submitted);
    assert_eq!(records[0].answers, vec!["Shipped the parser", "Reviews"]);
    assert_eq!(
        h.gateway
            .channel_posts(&ChannelId::new("reports"))
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn skipping_writes_exactly_one_skipped_record() {
    let h = harness();
    let standup = h.standup("Backend", "boss", &["alice"]).await;
    let alice = ParticipantId::new("alice");

    h.send(
        "alice",
        false,
        InteractionKind::Command(CommandInvocation::new("start")),
    )
    .await;
    h.click("alice", ComponentAction::SkipReport { standup: standup.id }, &[])
        .await;
    let again = h
        .click("alice", ComponentAction::SkipReport { standup: standup.id }, &[])
        .await;
    assert!(matches!(again, Reply::Message(ref m) if m.content.contains("already submitted")));

    let day = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
    let records = h.directory.query(&alice, standup.id, day).await.expect("query");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, HistoryOutcome::Skipped);
}

#[tokio::test]
async fn non_member_cannot_answer_for_a_standup() {
    let h = harness();
    let standup = h.standup("Backend", "boss", &["alice"]).await;
    let reply = h
        .click("mallory", ComponentAction::FillReport { standup: standup.id }, &[])
        .await;
    assert!(matches!(reply, Reply::Message(ref m) if m.ephemeral));
    assert!(
        h.sessions
            .get(&SessionKey::report(ParticipantId::new("mallory"), standup.id))
            .await
            .is_err()
    );
}
