//! Membership administration, read views, autocomplete, and data removal.

use crate::controller::{FlowController, authorize_manager, require_guild};
use crate::error::FlowError;
use crate::gateway::{AutocompleteRequest, Choice, Invoker, OutboundMessage, Response};
use crate::render;
use chrono::Days;
use huddle_core::ParticipantId;
use huddle_directory::{Standup, StandupQuery};

/// History window used when none is given.
pub const DEFAULT_HISTORY_DAYS: i64 = 5;
/// Upper bound on the history window.
pub const MAX_HISTORY_DAYS: i64 = 10;
const MAX_HISTORY_RECORDS: usize = 10;

impl FlowController {
    /// `delete-standup`.
    pub(crate) async fn delete_standup(
        &self,
        invoker: &Invoker,
        name: &str,
    ) -> Result<Response, FlowError> {
        let standup = self.standup_named(invoker, name).await?;
        authorize_manager(&standup, invoker)?;

        self.directory.delete_standup(standup.id).await?;
        tracing::info!(standup = %standup.id, participant = %invoker.participant, "Standup deleted");
        Ok(Response::message(OutboundMessage::ephemeral(format!(
            "🗑️ ✅ Standup **{}** and all its participant links have been permanently deleted.",
            standup.name
        ))))
    }

    /// `add-member`: grant membership, then welcome the member in the background.
    pub(crate) async fn add_member(
        &self,
        invoker: &Invoker,
        user: &ParticipantId,
        name: &str,
    ) -> Result<Response, FlowError> {
        let standup = self.standup_named(invoker, name).await?;
        authorize_manager(&standup, invoker)?;

        if !self.directory.add_member(standup.id, user).await? {
            return Err(FlowError::validation(format!(
                "{} is already a member of **{}**.",
                user.mention(),
                standup.name
            )));
        }
        tracing::info!(standup = %standup.id, participant = %user, "Member added");

        let reply = OutboundMessage::text(format!(
            "✅ {} has been added to **{}**!",
            user.mention(),
            standup.name
        ));
        let controller = self.clone();
        let user = user.clone();
        Ok(Response::message(reply).with_follow_up(async move {
            let zone = controller.zone_of(&user).await;
            controller
                .notify(&user, render::welcome(&standup, zone.as_deref()))
                .await;
        }))
    }

    /// `remove-member`.
    pub(crate) async fn remove_member(
        &self,
        invoker: &Invoker,
        user: &ParticipantId,
        name: &str,
    ) -> Result<Response, FlowError> {
        let standup = self.standup_named(invoker, name).await?;
        authorize_manager(&standup, invoker)?;

        if !self.directory.remove_member(standup.id, user).await? {
            return Err(FlowError::validation(format!(
                "{} is not a member of **{}**.",
                user.mention(),
                standup.name
            )));
        }
        tracing::info!(standup = %standup.id, participant = %user, "Member removed");

        let reply = OutboundMessage::text(format!(
            "✅ {} has been removed from **{}**.",
            user.mention(),
            standup.name
        ));
        let controller = self.clone();
        let user = user.clone();
        Ok(Response::message(reply).with_follow_up(async move {
            controller.notify(&user, render::removed_notice(&standup)).await;
        }))
    }

    /// `standup-info`.
    pub(crate) async fn standup_info(
        &self,
        invoker: &Invoker,
        name: &str,
    ) -> Result<Response, FlowError> {
        let standup = self.standup_named(invoker, name).await?;
        let members = self.directory.members(standup.id).await?;
        Ok(Response::message(
            OutboundMessage::ephemeral("").with_embed(render::standup_info(&standup, &members)),
        ))
    }

    /// `history`: the caller's own records, or a member's for the manager.
    pub(crate) async fn history(
        &self,
        invoker: &Invoker,
        user: &ParticipantId,
        name: &str,
        days: Option<i64>,
    ) -> Result<Response, FlowError> {
        let standup = self.standup_named(invoker, name).await?;
        if user != &invoker.participant && authorize_manager(&standup, invoker).is_err() {
            return Err(FlowError::unauthorized(
                "You can only view your own history, or history for teams you manage.",
            ));
        }

        let days = history_window(days);
        let today = self.local_today(user).await?;
        let since = today
            .checked_sub_days(Days::new(days.unsigned_abs()))
            .unwrap_or(today);

        let mut records = self.ledger.query(user, standup.id, since).await?;
        records.truncate(MAX_HISTORY_RECORDS);
        Ok(Response::message(render::history(user, &standup, &records, days)))
    }

    /// Standup-name suggestions for an autocompleted option.
    pub(crate) async fn autocomplete(
        &self,
        invoker: &Invoker,
        request: &AutocompleteRequest,
    ) -> Result<Vec<Choice>, FlowError> {
        let guild = require_guild(invoker)?;

        let standups: Vec<Standup> = if request.command == "start" {
            let query = StandupQuery::in_guild(guild.clone()).name_contains(request.value.as_str());
            self.directory
                .standups_for(&invoker.participant)
                .await?
                .into_iter()
                .filter(|s| query.matches(s))
                .take(StandupQuery::MAX_RESULTS)
                .collect()
        } else {
            let mut query =
                StandupQuery::in_guild(guild.clone()).name_contains(request.value.as_str());
            if !invoker.is_admin {
                query = query.managed_by(invoker.participant.clone());
            }
            self.directory.search_standups(&query).await?
        };

        Ok(standups
            .into_iter()
            .map(|s| Choice {
                name: s.name.clone(),
                value: s.name,
            })
            .collect())
    }

    /// `delete-my-data`: archive the profile and drop every membership.
    pub(crate) async fn delete_my_data(&self, invoker: &Invoker) -> Result<Response, FlowError> {
        let Some(mut profile) = self.directory.get_participant(&invoker.participant).await? else {
            return Err(FlowError::not_found(render::NO_PROFILE));
        };

        let removed = self.directory.clear_memberships(&profile.id).await?;
        profile.archive();
        self.directory.save_participant(&profile).await?;

        tracing::info!(participant = %profile.id, memberships = removed, "Profile archived");
        Ok(Response::message(OutboundMessage::ephemeral(
            render::PROFILE_RESET,
        )))
    }
}

/// Clamps a requested history window to `1..=MAX_HISTORY_DAYS`.
#[must_use]
pub fn history_window(days: Option<i64>) -> i64 {
    days.unwrap_or(DEFAULT_HISTORY_DAYS).clamp(1, MAX_HISTORY_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Reply;
    use crate::testing::RecordingGateway;
    use chrono::{NaiveDate, TimeZone, Utc};
    use huddle_core::GuildId;
    use huddle_directory::{
        ActiveDays, DirectoryStore, HistoryLedger, InMemoryDirectory, NewHistoryRecord,
        NewStandup, TriggerTime,
    };
    use huddle_session::InMemorySessionStore;
    use std::sync::Arc;

    struct Fixture {
        controller: FlowController,
        directory: InMemoryDirectory,
        gateway: RecordingGateway,
        standup: Standup,
    }

    async fn fixture() -> Fixture {
        let directory = InMemoryDirectory::new();
        let gateway = RecordingGateway::new();
        let standup = directory
            .create_standup(NewStandup {
                guild_id: GuildId::new("g"),
                name: "Platform".to_string(),
                manager_id: ParticipantId::new("m"),
                report_channel: None,
                questions: vec!["Yesterday?".to_string(), "Today?".to_string()],
                trigger_time: TriggerTime::default(),
                active_days: ActiveDays::default(),
                members: vec![ParticipantId::new("m"), ParticipantId::new("u")],
            })
            .await
            .expect("create");
        let fixed = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let controller = FlowController::new(
            Arc::new(directory.clone()),
            Arc::new(directory.clone()),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(gateway.clone()),
        )
        .with_clock(Arc::new(move || fixed));
        Fixture {
            controller,
            directory,
            gateway,
            standup,
        }
    }

    fn invoker(id: &str) -> Invoker {
        Invoker {
            participant: ParticipantId::new(id),
            guild: Some(GuildId::new("g")),
            channel: None,
            is_admin: false,
        }
    }

    #[test]
    fn window_is_clamped() {
        assert_eq!(history_window(None), 5);
        assert_eq!(history_window(Some(30)), 10);
        assert_eq!(history_window(Some(0)), 1);
        assert_eq!(history_window(Some(-3)), 1);
    }

    #[tokio::test]
    async fn adding_twice_is_rejected() {
        let f = fixture().await;
        let newcomer = ParticipantId::new("n");
        f.controller
            .add_member(&invoker("m"), &newcomer, "Platform")
            .await
            .expect("add")
            .finish()
            .await;
        assert_eq!(f.gateway.direct_to(&newcomer).await.len(), 1);

        let err = f
            .controller
            .add_member(&invoker("m"), &newcomer, "Platform")
            .await
            .expect_err("duplicate");
        assert!(err.user_message().contains("already a member"));
    }

    #[tokio::test]
    async fn add_revives_archived_profile() {
        let f = fixture().await;
        f.controller
            .delete_my_data(&invoker("u"))
            .await
            .expect("delete");
        let archived = f
            .directory
            .get_participant(&ParticipantId::new("u"))
            .await
            .expect("get")
            .expect("profile");
        assert!(!archived.is_active());
        assert!(
            f.directory
                .standups_for(&ParticipantId::new("u"))
                .await
                .expect("standups")
                .is_empty()
        );

        f.controller
            .add_member(&invoker("m"), &ParticipantId::new("u"), "Platform")
            .await
            .expect("add");
        let revived = f
            .directory
            .get_participant(&ParticipantId::new("u"))
            .await
            .expect("get")
            .expect("profile");
        assert!(revived.is_active());
    }

    #[tokio::test]
    async fn removing_non_member_is_rejected() {
        let f = fixture().await;
        let err = f
            .controller
            .remove_member(&invoker("m"), &ParticipantId::new("x"), "Platform")
            .await
            .expect_err("not a member");
        assert!(matches!(err, FlowError::Validation { .. }));
    }

    #[tokio::test]
    async fn removal_notifies_member() {
        let f = fixture().await;
        f.controller
            .remove_member(&invoker("m"), &ParticipantId::new("u"), "Platform")
            .await
            .expect("remove")
            .finish()
            .await;
        let notices = f.gateway.direct_to(&ParticipantId::new("u")).await;
        assert_eq!(notices.len(), 1);
        assert!(notices[0].content.contains("removed"));
    }

    #[tokio::test]
    async fn members_cannot_manage() {
        let f = fixture().await;
        assert!(matches!(
            f.controller.delete_standup(&invoker("u"), "Platform").await,
            Err(FlowError::Unauthorized { .. })
        ));
        f.controller
            .delete_standup(&invoker("m"), "Platform")
            .await
            .expect("manager deletes");
        assert!(f.directory.get_standup(f.standup.id).await.is_err());
    }

    #[tokio::test]
    async fn history_is_limited_to_self_or_manager() {
        let f = fixture().await;
        let day = NaiveDate::from_ymd_opt(2024, 6, 9).expect("date");
        f.directory
            .create(NewHistoryRecord::submitted(
                ParticipantId::new("u"),
                f.standup.id,
                day,
                vec!["shipped".to_string(), "review".to_string()],
            ))
            .await
            .expect("record");

        let own = f
            .controller
            .history(&invoker("u"), &ParticipantId::new("u"), "Platform", None)
            .await
            .expect("own");
        match own.reply {
            Reply::Message(message) => assert_eq!(message.embeds.len(), 1),
            other => panic!("unexpected reply: {other:?}"),
        }

        assert!(
            f.controller
                .history(&invoker("m"), &ParticipantId::new("u"), "Platform", Some(3))
                .await
                .is_ok()
        );
        assert!(matches!(
            f.controller
                .history(&invoker("x"), &ParticipantId::new("u"), "Platform", None)
                .await,
            Err(FlowError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn autocomplete_shows_managed_standups() {
        let f = fixture().await;
        let request = AutocompleteRequest {
            command: "edit-standup".to_string(),
            option: "standup_name".to_string(),
            value: "plat".to_string(),
        };
        let managed = f
            .controller
            .autocomplete(&invoker("m"), &request)
            .await
            .expect("manager");
        assert_eq!(managed.len(), 1);
        assert_eq!(managed[0].value, "Platform");

        let none = f
            .controller
            .autocomplete(&invoker("u"), &request)
            .await
            .expect("member");
        assert!(none.is_empty());

        let start = AutocompleteRequest {
            command: "start".to_string(),
            ..request
        };
        assert_eq!(
            f.controller
                .autocomplete(&invoker("u"), &start)
                .await
                .expect("start")
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn delete_my_data_without_profile() {
        let f = fixture().await;
        assert_eq!(
            f.controller.delete_my_data(&invoker("ghost")).await.err(),
            Some(FlowError::not_found(render::NO_PROFILE))
        );
    }
}
