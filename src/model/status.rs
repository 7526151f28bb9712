use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::entry_time::ScoutServiceGetEntryTime;
use crate::model::robot::AgentRobot;
use crate::model::service::ScoutService;
use crate::model::template::ScoutServiceTemplate;

/// スケジュール状態（4状態）
///
/// Scheduled → Due → Dispatched → Scheduled (next day/week). Suppressed is
/// entered whenever the owning service or robot is inactive and leaves again
/// automatically once the gate re-activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Due,
    Dispatched,
    Suppressed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Due => "due",
            ScheduleStatus::Dispatched => "dispatched",
            ScheduleStatus::Suppressed => "suppressed",
        }
    }
}

fn same_minute(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.with_second(0).and_then(|t| t.with_nanosecond(0))
        == b.with_second(0).and_then(|t| t.with_nanosecond(0))
}

/// Evaluate a template's schedule status for one dispatcher tick.
///
/// `local_now` is the tick in the schedule timezone (what `is_due` reads);
/// `utc_now` is the same instant in UTC (what `last_send_at` is compared
/// against).
pub fn evaluate_template(
    robot: &AgentRobot,
    service: &ScoutService,
    template: &ScoutServiceTemplate,
    local_now: &NaiveDateTime,
    utc_now: &DateTime<Utc>,
) -> ScheduleStatus {
    if !robot.can_create_scout() || !service.active {
        return ScheduleStatus::Suppressed;
    }

    if let Some(last) = &template.last_send_at {
        if same_minute(last, utc_now) {
            return ScheduleStatus::Dispatched;
        }
    }

    if template.is_due(local_now) {
        ScheduleStatus::Due
    } else {
        ScheduleStatus::Scheduled
    }
}

/// Evaluate an entry-time schedule for one dispatcher tick.
///
/// Entry polling runs under the `entry_active` gate, not `scout_active`, and
/// records no dispatch timestamp, so the cycle is Scheduled → Due →
/// Scheduled with Suppressed whenever a gate closes.
pub fn evaluate_entry_time(
    robot: &AgentRobot,
    service: &ScoutService,
    entry_time: &ScoutServiceGetEntryTime,
    local_now: &NaiveDateTime,
) -> ScheduleStatus {
    if !robot.can_create_entry() || !service.active {
        return ScheduleStatus::Suppressed;
    }

    if entry_time.is_due(local_now) {
        ScheduleStatus::Due
    } else {
        ScheduleStatus::Scheduled
    }
}
