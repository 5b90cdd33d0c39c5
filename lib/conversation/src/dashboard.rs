//! Settings dashboard and question dashboard.
//!
//! Every step re-reads the standup and re-checks that the caller manages it,
//! since the dashboard message can outlive a change of manager.

use crate::controller::{FlowController, authorize_manager};
use crate::error::FlowError;
use crate::form::{FormField, FormValues};
use crate::gateway::{Invoker, Reply, Response};
use crate::render;
use huddle_core::{ChannelId, StandupId};
use huddle_directory::{ActiveDays, DirectoryError, Standup, TriggerTime, ValidationError};

/// Optional changes carried by `edit-standup`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub new_channel: Option<ChannelId>,
    pub new_time: Option<String>,
}

impl FlowController {
    /// `edit-standup`: apply basic changes, then show the settings dashboard.
    pub(crate) async fn edit_standup(
        &self,
        invoker: &Invoker,
        name: &str,
        change: SettingsChange,
    ) -> Result<Response, FlowError> {
        let mut standup = self.standup_named(invoker, name).await?;
        authorize_manager(&standup, invoker)?;

        let mut changes = Vec::new();
        if let Some(raw) = change.new_time.as_deref() {
            standup.trigger_time = raw
                .parse::<TriggerTime>()
                .map_err(|_| FlowError::validation(render::INVALID_TIME))?;
            changes.push(format!("Trigger Time ({})", standup.trigger_time));
        }
        if let Some(channel) = change.new_channel {
            changes.push(format!("Report Channel ({})", channel.mention()));
            standup.report_channel = Some(channel);
        }

        if !changes.is_empty() {
            self.directory.update_standup(&standup).await?;
            tracing::info!(standup = %standup.id, changes = ?changes, "Standup settings updated");
        }
        Ok(Response::message(render::edit_dashboard(&standup, &changes)))
    }

    /// Active-day multi-select.
    pub(crate) async fn edit_days(
        &self,
        invoker: &Invoker,
        standup: StandupId,
        values: &[String],
    ) -> Result<Response, FlowError> {
        let mut standup = self.managed_standup(invoker, standup).await?;
        if values.is_empty() {
            return Err(DirectoryError::from(ValidationError::NoActiveDays).into());
        }
        standup.active_days =
            ActiveDays::parse_list(&values.join(",")).map_err(DirectoryError::from)?;

        self.directory.update_standup(&standup).await?;
        tracing::info!(standup = %standup.id, days = %standup.active_days, "Active days updated");
        Ok(Response::update(render::days_updated(&standup)))
    }

    /// "Edit Questions".
    pub(crate) async fn open_questions(
        &self,
        invoker: &Invoker,
        standup: StandupId,
    ) -> Result<Response, FlowError> {
        let standup = self.managed_standup(invoker, standup).await?;
        Ok(Response::update(render::question_dashboard(&standup)))
    }

    /// A question was picked from the dashboard.
    pub(crate) async fn select_question(
        &self,
        invoker: &Invoker,
        standup: StandupId,
        values: &[String],
    ) -> Result<Response, FlowError> {
        let standup = self.managed_standup(invoker, standup).await?;
        let index: usize = values
            .first()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| FlowError::validation("Please select a question."))?;
        if index >= standup.questions.len() {
            return Err(DirectoryError::from(ValidationError::QuestionOutOfRange {
                index,
                len: standup.questions.len(),
            })
            .into());
        }
        Ok(Response::reply(Reply::Form(render::edit_question_form(
            &standup, index,
        ))))
    }

    /// "Add New Question".
    pub(crate) async fn prompt_new_question(
        &self,
        invoker: &Invoker,
        standup: StandupId,
    ) -> Result<Response, FlowError> {
        let standup = self.managed_standup(invoker, standup).await?;
        Ok(Response::reply(Reply::Form(render::add_question_form(
            &standup,
        ))))
    }

    /// Replace question `index`, or delete it when the text was cleared.
    pub(crate) async fn submit_question_edit(
        &self,
        invoker: &Invoker,
        standup: StandupId,
        index: usize,
        fields: &FormValues,
    ) -> Result<Response, FlowError> {
        let mut standup = self.managed_standup(invoker, standup).await?;
        standup
            .edit_question(index, fields.text(FormField::QuestionText))
            .map_err(DirectoryError::from)?;

        self.directory.update_standup(&standup).await?;
        tracing::info!(standup = %standup.id, index, "Question edited");
        Ok(Response::update(render::question_dashboard(&standup)))
    }

    pub(crate) async fn submit_new_question(
        &self,
        invoker: &Invoker,
        standup: StandupId,
        fields: &FormValues,
    ) -> Result<Response, FlowError> {
        let mut standup = self.managed_standup(invoker, standup).await?;
        standup
            .push_question(fields.required(FormField::QuestionText)?)
            .map_err(DirectoryError::from)?;

        self.directory.update_standup(&standup).await?;
        tracing::info!(standup = %standup.id, count = standup.questions.len(), "Question added");
        Ok(Response::update(render::question_dashboard(&standup)))
    }

    /// "Done".
    pub(crate) async fn finish_editing(
        &self,
        invoker: &Invoker,
        standup: StandupId,
    ) -> Result<Response, FlowError> {
        let standup = self.managed_standup(invoker, standup).await?;
        Ok(Response::update(render::editing_finished(&standup)))
    }

    async fn managed_standup(
        &self,
        invoker: &Invoker,
        standup: StandupId,
    ) -> Result<Standup, FlowError> {
        let standup = self.directory.get_standup(standup).await?;
        authorize_manager(&standup, invoker)?;
        Ok(standup)
    }
}
