//! Nudge types, slots and the per-type lifecycle view.
//!
//! ## Slots
//!
//! ```text
//! morning  : DailyShowUp | SetupNextStep   (mutually exclusive)
//! focus    : DailyFocus
//! goal     : GoalNudge
//! ```
//!
//! `SetupNextStep` is never evaluated on its own; it only appears as the
//! empty-state substitute for the morning slot.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NudgeType {
    DailyShowUp,
    DailyFocus,
    GoalNudge,
    SetupNextStep,
}

impl NudgeType {
    pub const ALL: [NudgeType; 4] = [
        NudgeType::DailyShowUp,
        NudgeType::DailyFocus,
        NudgeType::GoalNudge,
        NudgeType::SetupNextStep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NudgeType::DailyShowUp => "dailyShowUp",
            NudgeType::DailyFocus => "dailyFocus",
            NudgeType::GoalNudge => "goalNudge",
            NudgeType::SetupNextStep => "setupNextStep",
        }
    }

    /// The slot this type is scheduled in.
    pub fn slot(&self) -> Slot {
        match self {
            NudgeType::DailyShowUp | NudgeType::SetupNextStep => Slot::Morning,
            NudgeType::DailyFocus => Slot::Focus,
            NudgeType::GoalNudge => Slot::Goal,
        }
    }
}

impl fmt::Display for NudgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NudgeType {
    type Err = String;

    /// Accepts `dailyShowUp`, `daily-show-up` and `daily_show_up` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "dailyshowup" | "showup" => Ok(NudgeType::DailyShowUp),
            "dailyfocus" | "focus" => Ok(NudgeType::DailyFocus),
            "goalnudge" | "goal" => Ok(NudgeType::GoalNudge),
            "setupnextstep" | "setup" => Ok(NudgeType::SetupNextStep),
            _ => Err(format!("unknown nudge type: {s}")),
        }
    }
}

/// A logical slot. Exactly one type is active per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Morning,
    Focus,
    Goal,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Morning, Slot::Focus, Slot::Goal];

    /// The type that owns the slot and receives settings/foreground passes.
    pub fn owner(&self) -> NudgeType {
        match self {
            Slot::Morning => NudgeType::DailyShowUp,
            Slot::Focus => NudgeType::DailyFocus,
            Slot::Goal => NudgeType::GoalNudge,
        }
    }

    /// Every type that may hold a live handle in this slot.
    pub fn members(&self) -> &'static [NudgeType] {
        match self {
            Slot::Morning => &[NudgeType::DailyShowUp, NudgeType::SetupNextStep],
            Slot::Focus => &[NudgeType::DailyFocus],
            Slot::Goal => &[NudgeType::GoalNudge],
        }
    }
}

/// Which nudge the morning slot shows.
///
/// A single sum type instead of two toggles, so `DailyShowUp` and
/// `SetupNextStep` can never both be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MorningSlot {
    Show(MorningNudge),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MorningNudge {
    ShowUp,
    SetupNextStep,
}

impl MorningNudge {
    pub fn nudge_type(&self) -> NudgeType {
        match self {
            MorningNudge::ShowUp => NudgeType::DailyShowUp,
            MorningNudge::SetupNextStep => NudgeType::SetupNextStep,
        }
    }
}

impl MorningSlot {
    pub fn nudge_type(&self) -> Option<NudgeType> {
        match self {
            MorningSlot::Show(n) => Some(n.nudge_type()),
            MorningSlot::None => None,
        }
    }
}

/// Lifecycle state of one type, derived from its ledger entry.
///
/// ```text
/// Unscheduled -> Scheduled -> PendingOpen -> (Opened | Unopened)
///      ^                                           |
///      +---------------- next pass ----------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeState {
    Unscheduled,
    Scheduled,
    /// Fired, no open seen yet and not yet counted.
    PendingOpen,
    Opened,
    Unopened,
}

impl NudgeState {
    pub fn of(entry: &LedgerEntry) -> Self {
        if entry.currently_scheduled_id.is_some() {
            return NudgeState::Scheduled;
        }
        let Some(fired) = entry.last_fired_date else {
            return NudgeState::Unscheduled;
        };
        if entry.last_open_date.is_some_and(|opened| opened >= fired) {
            NudgeState::Opened
        } else if entry.last_no_open_date == Some(fired) {
            NudgeState::Unopened
        } else {
            NudgeState::PendingOpen
        }
    }
}

impl fmt::Display for NudgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NudgeState::Unscheduled => "unscheduled",
            NudgeState::Scheduled => "scheduled",
            NudgeState::PendingOpen => "pending_open",
            NudgeState::Opened => "opened",
            NudgeState::Unopened => "unopened",
        };
        f.write_str(s)
    }
}

/// `true` when `date` is the same calendar day as `today`.
pub(crate) fn is_today(date: Option<NaiveDate>, today: NaiveDate) -> bool {
    date == Some(today)
}
