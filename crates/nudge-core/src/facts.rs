//! Domain facts consumed by eligibility.
//!
//! The engine never owns Arcs, Goals or Activities. It reads a snapshot of
//! counts through [`FactsProvider`], once per reconciliation pass.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::nudge::NudgeType;

pub type GoalId = String;

/// Per-type reminder settings, as projected from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeSettings {
    pub daily_show_up_enabled: bool,
    /// Minutes after local midnight.
    pub daily_show_up_offset_minutes: u32,
    pub daily_focus_enabled: bool,
    /// Minutes after local midnight.
    pub daily_focus_offset_minutes: u32,
    pub goal_nudge_enabled: bool,
    pub goal_nudge_time_of_day: NaiveTime,
}

impl Default for NudgeSettings {
    fn default() -> Self {
        Self {
            daily_show_up_enabled: false,
            daily_show_up_offset_minutes: 8 * 60,
            daily_focus_enabled: false,
            daily_focus_offset_minutes: 20 * 60,
            goal_nudge_enabled: false,
            goal_nudge_time_of_day: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }
}

impl NudgeSettings {
    pub fn is_enabled(&self, nudge: NudgeType) -> bool {
        match nudge {
            // The empty-state nudge rides on the show-up toggle.
            NudgeType::DailyShowUp | NudgeType::SetupNextStep => self.daily_show_up_enabled,
            NudgeType::DailyFocus => self.daily_focus_enabled,
            NudgeType::GoalNudge => self.goal_nudge_enabled,
        }
    }

    /// Wall-clock time of day at which `nudge` fires.
    pub fn fire_time(&self, nudge: NudgeType) -> NaiveTime {
        match nudge {
            NudgeType::DailyShowUp | NudgeType::SetupNextStep => {
                offset_to_time(self.daily_show_up_offset_minutes)
            }
            NudgeType::DailyFocus => offset_to_time(self.daily_focus_offset_minutes),
            NudgeType::GoalNudge => self.goal_nudge_time_of_day,
        }
    }

    /// `date` at the fire time of `nudge`.
    pub fn fire_at(&self, nudge: NudgeType, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.fire_time(nudge))
    }
}

/// Offsets past the end of the day clamp to 23:59.
fn offset_to_time(minutes: u32) -> NaiveTime {
    let minutes = minutes.min(24 * 60 - 1);
    NaiveTime::default() + Duration::minutes(i64::from(minutes))
}

/// Read-only snapshot supplied by collaborators at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalFacts {
    pub last_show_up_date: Option<NaiveDate>,
    pub goal_count: u32,
    pub incomplete_activity_count_by_goal: BTreeMap<GoalId, u32>,
    pub any_activity_scheduled_today: bool,
    pub settings: NudgeSettings,
}

impl GlobalFacts {
    /// At least one goal with one or more incomplete activities.
    pub fn has_actionable_goal(&self) -> bool {
        self.goal_count > 0
            && self
                .incomplete_activity_count_by_goal
                .values()
                .any(|count| *count > 0)
    }

    /// The empty state: no goals, or nothing left to do in any of them.
    pub fn is_empty_state(&self) -> bool {
        !self.has_actionable_goal()
    }
}

pub type FactsResult = Result<GlobalFacts, Box<dyn std::error::Error + Send + Sync>>;

/// Supplies [`GlobalFacts`]. Must be consistent within one pass.
pub trait FactsProvider: Send + Sync {
    fn global_facts(&self, now: NaiveDateTime) -> FactsResult;
}

/// Fixed facts, for fixtures and for callers that already hold a snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticFacts(pub GlobalFacts);

impl FactsProvider for StaticFacts {
    fn global_facts(&self, _now: NaiveDateTime) -> FactsResult {
        Ok(self.0.clone())
    }
}

impl<T: FactsProvider + ?Sized> FactsProvider for std::sync::Arc<T> {
    fn global_facts(&self, now: NaiveDateTime) -> FactsResult {
        (**self).global_facts(now)
    }
}
