use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::nudge::NudgeType;
use crate::scheduler::NotificationHandle;

/// Every state change in the engine produces an Event.
/// Callers log or display them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    NudgeScheduled {
        nudge: NudgeType,
        /// Type actually shown; differs from `nudge` for substitutes.
        effective: NudgeType,
        handle: NotificationHandle,
        fire_at: NaiveDateTime,
    },
    NudgeCancelled {
        nudge: NudgeType,
        handle: NotificationHandle,
        /// The OS no longer knew the handle.
        stale: bool,
    },
    NudgeFired {
        nudge: NudgeType,
        date: NaiveDate,
    },
    NudgeOpened {
        nudge: NudgeType,
        date: NaiveDate,
    },
    /// A fire went unopened and was counted towards backoff.
    NoOpenRecorded {
        nudge: NudgeType,
        consecutive_no_open_count: u32,
    },
    BackoffApplied {
        nudge: NudgeType,
        base_target: NaiveDateTime,
        adjusted_target: NaiveDateTime,
    },
    ShowUpRecorded {
        date: NaiveDate,
    },
    FocusSessionRecorded {
        date: NaiveDate,
    },
    /// Arming failed; the type stays unscheduled until the next trigger.
    ScheduleFailed {
        nudge: NudgeType,
        reason: String,
    },
}

impl Event {
    pub fn nudge(&self) -> Option<NudgeType> {
        match self {
            Event::NudgeScheduled { nudge, .. }
            | Event::NudgeCancelled { nudge, .. }
            | Event::NudgeFired { nudge, .. }
            | Event::NudgeOpened { nudge, .. }
            | Event::NoOpenRecorded { nudge, .. }
            | Event::BackoffApplied { nudge, .. }
            | Event::ScheduleFailed { nudge, .. } => Some(*nudge),
            Event::ShowUpRecorded { .. } | Event::FocusSessionRecorded { .. } => None,
        }
    }
}
