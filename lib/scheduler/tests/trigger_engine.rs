//! Scans against in-memory stores and a recording gateway.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use huddle_conversation::FlowController;
use huddle_conversation::testing::RecordingGateway;
use huddle_core::{GuildId, ParticipantId};
use huddle_directory::{
    ActiveDays, DirectoryStore, HistoryLedger, InMemoryDirectory, NewHistoryRecord, NewStandup,
    Participant, Standup, TriggerTime,
};
use huddle_scheduler::{TickReport, TriggerEngine};
use huddle_session::{InMemorySessionStore, SessionKey, SessionStore};
use std::sync::Arc;

struct Harness {
    engine: TriggerEngine,
    directory: InMemoryDirectory,
    sessions: InMemorySessionStore,
    gateway: RecordingGateway,
}

fn harness() -> Harness {
    let directory = InMemoryDirectory::new();
    let sessions = InMemorySessionStore::new();
    let gateway = RecordingGateway::new();
    let controller = FlowController::new(
        Arc::new(directory.clone()),
        Arc::new(directory.clone()),
        Arc::new(sessions.clone()),
        Arc::new(gateway.clone()),
    );
    let engine = TriggerEngine::new(
        Arc::new(directory.clone()),
        Arc::new(directory.clone()),
        Arc::new(gateway.clone()),
        Arc::new(controller),
    );
    Harness {
        engine,
        directory,
        sessions,
        gateway,
    }
}

impl Harness {
    async fn member(&self, id: &str, timezone: &str) -> ParticipantId {
        let mut profile = Participant::new(ParticipantId::new(id));
        profile.timezone = Some(timezone.to_string());
        self.directory.save_participant(&profile).await.expect("save");
        profile.id
    }

    async fn standup(&self, members: &[&ParticipantId]) -> Standup {
        self.directory
            .create_standup(NewStandup {
                guild_id: GuildId::new("g"),
                name: "Daily".to_string(),
                manager_id: ParticipantId::new("boss"),
                report_channel: None,
                questions: vec!["Yesterday?".to_string()],
                trigger_time: TriggerTime::new(9, 0).expect("time"),
                active_days: ActiveDays::ALL,
                members: members.iter().map(|m| (*m).clone()).collect(),
            })
            .await
            .expect("create")
    }
}

fn utc(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, h, m, 0).unwrap()
}

#[tokio::test]
async fn fires_at_nine_local_in_kolkata_only() {
    let h = harness();
    let priya = h.member("priya", "Asia/Kolkata").await;
    let standup = h.standup(&[&priya]).await;

    // 08:59 and 09:01 IST.
    for now in [utc(3, 29), utc(3, 31)] {
        let report = h.engine.tick(now).await.expect("tick");
        assert_eq!(report.fired, 0, "at {now}");
    }
    assert!(h.gateway.direct_to(&priya).await.is_empty());

    // 09:00 IST.
    let report = h.engine.tick(utc(3, 30)).await.expect("tick");
    assert_eq!(
        report,
        TickReport {
            checked: 1,
            fired: 1,
            failed: 0
        }
    );

    let messages = h.gateway.direct_to(&priya).await;
    assert_eq!(messages.len(), 2, "reminder then prompt");
    assert!(
        h.sessions
            .get(&SessionKey::report(priya.clone(), standup.id))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn existing_record_suppresses_the_trigger() {
    let h = harness();
    let priya = h.member("priya", "Asia/Kolkata").await;
    let standup = h.standup(&[&priya]).await;
    h.directory
        .create(NewHistoryRecord::skipped(
            priya.clone(),
            standup.id,
            NaiveDate::from_ymd_opt(2024, 6, 3).expect("date"),
        ))
        .await
        .expect("record");

    let report = h.engine.tick(utc(3, 30)).await.expect("tick");
    assert_eq!(report.fired, 0);
    assert!(h.gateway.direct_to(&priya).await.is_empty());
}

#[tokio::test]
async fn one_bad_participant_does_not_stop_the_scan() {
    let h = harness();
    let broken = h.member("broken", "Mars/Olympus").await;
    let unreachable = h.member("away", "UTC").await;
    let fine = h.member("fine", "UTC").await;
    h.gateway.make_unreachable(unreachable.clone()).await;
    h.standup(&[&broken, &unreachable, &fine]).await;

    let report = h.engine.tick(utc(9, 0)).await.expect("tick");
    assert_eq!(report.checked, 3);
    assert_eq!(report.fired, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(h.gateway.direct_to(&fine).await.len(), 2);
}

#[tokio::test]
async fn participants_without_timezone_are_skipped() {
    let h = harness();
    let unset = ParticipantId::new("unset");
    h.standup(&[&unset]).await;

    let report = h.engine.tick(utc(9, 0)).await.expect("tick");
    assert_eq!(report.checked, 1);
    assert_eq!(report.fired, 0);
    assert_eq!(report.failed, 0);
}
