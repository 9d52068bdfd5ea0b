//! Backoff for ignored nudges.
//!
//! Only `GoalNudge` backs off. Once the user has ignored it
//! `no_open_threshold` times in a row, the next occurrence moves out by
//! `extra_days`. The shift is flat: further ignores do not compound.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerEntry;
use crate::nudge::NudgeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub no_open_threshold: u32,
    pub extra_days: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            no_open_threshold: 2,
            extra_days: 1,
        }
    }
}

impl BackoffPolicy {
    /// Days to add on top of the eligibility target.
    pub fn offset_days(&self, nudge: NudgeType, entry: &LedgerEntry) -> u32 {
        if nudge != NudgeType::GoalNudge {
            return 0;
        }
        if entry.consecutive_no_open_count >= self.no_open_threshold {
            self.extra_days
        } else {
            0
        }
    }

    pub fn apply(
        &self,
        nudge: NudgeType,
        entry: &LedgerEntry,
        base: NaiveDateTime,
    ) -> NaiveDateTime {
        let offset = self.offset_days(nudge, entry);
        if offset > 0 {
            tracing::debug!(
                nudge = %nudge,
                no_open = entry.consecutive_no_open_count,
                offset,
                "backoff applied"
            );
        }
        base + Duration::days(i64::from(offset))
    }
}
