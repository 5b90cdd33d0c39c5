//! Due evaluation for one participant of one standup.

use crate::error::ScheduleError;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use huddle_directory::{Participant, Standup};

/// Returns the participant's local date if the standup is due for them at `now`.
///
/// A standup is due when the participant's local wall-clock `(hour, minute)`
/// equals the trigger time exactly and the local weekday is active.
/// Participants without a zone or with an archived profile are never due.
///
/// # Errors
///
/// Returns `InvalidTimezone` if the configured zone is unknown.
pub fn due(
    now: DateTime<Utc>,
    participant: &Participant,
    standup: &Standup,
) -> Result<Option<NaiveDate>, ScheduleError> {
    if !participant.is_active() {
        return Ok(None);
    }
    let Some(name) = participant.timezone() else {
        return Ok(None);
    };
    let tz: Tz = name.parse().map_err(|_| ScheduleError::InvalidTimezone {
        participant: participant.id.clone(),
        timezone: name.to_string(),
    })?;

    let local = now.with_timezone(&tz);
    if !standup.trigger_time.matches(local.hour(), local.minute()) {
        return Ok(None);
    }
    if !standup.active_days.contains(local.weekday()) {
        return Ok(None);
    }
    Ok(Some(local.date_naive()))
}
