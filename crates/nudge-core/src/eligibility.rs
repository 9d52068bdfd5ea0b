//! Eligibility evaluation.
//!
//! A pure function of the facts snapshot, the slot's history and `now`.
//! Re-running it with unchanged inputs yields the same answer, which is what
//! makes cancel-then-reschedule safe to repeat.
//!
//! | type           | ineligible when                                   | base target                         |
//! |----------------|---------------------------------------------------|-------------------------------------|
//! | dailyShowUp    | disabled                                          | day after max(today, settled)       |
//! | dailyFocus     | disabled                                          | day after max(today, completion)    |
//! | goalNudge      | disabled, nothing actionable, showed up today     | today if still ahead, else tomorrow |
//! | setupNextStep  | always (only reachable as the morning substitute) | -                                   |

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::facts::GlobalFacts;
use crate::ledger::LedgerEntry;
use crate::nudge::{is_today, MorningNudge, MorningSlot, NudgeType};

/// Why a type may not be scheduled right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suppression {
    Disabled,
    NoActionableGoal,
    ShowedUpToday,
    /// `setupNextStep` is only scheduled in place of `dailyShowUp`.
    SubstituteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    Eligible {
        /// The type actually shown. Differs from the evaluated type when the
        /// morning slot falls back to `setupNextStep`.
        effective: NudgeType,
        target: NaiveDateTime,
    },
    Ineligible(Suppression),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible { .. })
    }

    /// The substitute chosen for `nudge`, if any.
    pub fn substitute_for(&self, nudge: NudgeType) -> Option<NudgeType> {
        match self {
            Eligibility::Eligible { effective, .. } if *effective != nudge => Some(*effective),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<NaiveDateTime> {
        match self {
            Eligibility::Eligible { target, .. } => Some(*target),
            Eligibility::Ineligible(_) => None,
        }
    }
}

/// What eligibility needs to know about a slot's past.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotHistory {
    /// Latest scheduled date that actually fired, across the slot's members.
    pub settled: Option<NaiveDate>,
    /// Latest fire date across the slot's members.
    pub last_fired: Option<NaiveDate>,
    pub last_focus_completed: Option<NaiveDate>,
}

impl SlotHistory {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |acc, entry| Self {
            settled: acc.settled.max(entry.settled_date()),
            last_fired: acc.last_fired.max(entry.last_fired_date),
            last_focus_completed: acc.last_focus_completed,
        })
    }

    pub fn with_focus_completed(mut self, date: Option<NaiveDate>) -> Self {
        self.last_focus_completed = date;
        self
    }
}

/// Which nudge, if any, the morning slot shows under these facts.
pub fn morning_slot(facts: &GlobalFacts) -> MorningSlot {
    if !facts.settings.daily_show_up_enabled {
        MorningSlot::None
    } else if facts.is_empty_state() {
        MorningSlot::Show(MorningNudge::SetupNextStep)
    } else {
        MorningSlot::Show(MorningNudge::ShowUp)
    }
}

/// Decide whether `nudge` may be scheduled and, if so, its base target.
///
/// Backoff is not applied here.
pub fn evaluate(
    nudge: NudgeType,
    facts: &GlobalFacts,
    history: &SlotHistory,
    now: NaiveDateTime,
) -> Eligibility {
    let today = now.date();
    let decision = match nudge {
        NudgeType::DailyShowUp => evaluate_show_up(facts, history, today),
        NudgeType::DailyFocus => evaluate_focus(facts, history, today),
        NudgeType::GoalNudge => evaluate_goal(facts, history, now),
        NudgeType::SetupNextStep => Eligibility::Ineligible(Suppression::SubstituteOnly),
    };
    tracing::debug!(nudge = %nudge, ?decision, "eligibility evaluated");
    decision
}

fn evaluate_show_up(facts: &GlobalFacts, history: &SlotHistory, today: NaiveDate) -> Eligibility {
    let MorningSlot::Show(morning) = morning_slot(facts) else {
        return Eligibility::Ineligible(Suppression::Disabled);
    };
    let effective = morning.nudge_type();
    // Strictly after today, so a show-up today can never be followed by a
    // same-day reminder.
    let anchor = history.settled.map_or(today, |settled| settled.max(today));
    Eligibility::Eligible {
        effective,
        target: facts.settings.fire_at(effective, anchor + Duration::days(1)),
    }
}

fn evaluate_focus(facts: &GlobalFacts, history: &SlotHistory, today: NaiveDate) -> Eligibility {
    if !facts.settings.daily_focus_enabled {
        return Eligibility::Ineligible(Suppression::Disabled);
    }
    let anchor = [history.settled, history.last_focus_completed]
        .into_iter()
        .flatten()
        .fold(today, NaiveDate::max);
    Eligibility::Eligible {
        effective: NudgeType::DailyFocus,
        target: facts
            .settings
            .fire_at(NudgeType::DailyFocus, anchor + Duration::days(1)),
    }
}

fn evaluate_goal(facts: &GlobalFacts, history: &SlotHistory, now: NaiveDateTime) -> Eligibility {
    let today = now.date();
    if !facts.settings.goal_nudge_enabled {
        return Eligibility::Ineligible(Suppression::Disabled);
    }
    if !facts.has_actionable_goal() {
        return Eligibility::Ineligible(Suppression::NoActionableGoal);
    }
    if is_today(facts.last_show_up_date, today) {
        return Eligibility::Ineligible(Suppression::ShowedUpToday);
    }

    let time_of_day = facts.settings.goal_nudge_time_of_day;
    let still_ahead = now.time() < time_of_day;
    let fired_today = is_today(history.last_fired, today);
    let date = if still_ahead && !fired_today {
        today
    } else {
        today + Duration::days(1)
    };
    Eligibility::Eligible {
        effective: NudgeType::GoalNudge,
        target: date.and_time(time_of_day),
    }
}
