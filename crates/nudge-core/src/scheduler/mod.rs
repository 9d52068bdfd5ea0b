//! Scheduler for nudge one-shots.
//!
//! Turns an eligibility answer into cancel/arm calls on the notification
//! primitive and records the result in the ledger:
//!
//! 1. Cancel every live handle in the slot (substitutes included).
//! 2. Stop if the slot is ineligible.
//! 3. Arm the effective type at the backoff-adjusted target and store the
//!    handle.
//!
//! At most one handle is ever live per slot. A decision that matches the
//! live handle exactly is `NoChange` and touches nothing.

mod recording;

pub use recording::{ArmedNotification, RecordingPrimitive};

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::backoff::BackoffPolicy;
use crate::eligibility::{evaluate, Eligibility, SlotHistory};
use crate::error::{LedgerError, NotificationError, ReconcileError};
use crate::events::Event;
use crate::facts::GlobalFacts;
use crate::ledger::{GlobalKey, LedgerEntry, LedgerStore};
use crate::nudge::{NudgeType, Slot};

/// Opaque id of an armed OS notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The OS-level one-shot notification primitive.
///
/// Fire and open callbacks are delivered by the platform and routed into
/// the reconciler as events; they are not part of this trait.
pub trait NotificationPrimitive: Send + Sync {
    /// Arm a one-shot for slot owner `nudge`, shown as `effective`.
    fn arm_one_shot(
        &self,
        nudge: NudgeType,
        effective: NudgeType,
        fire_at: NaiveDateTime,
    ) -> Result<NotificationHandle, NotificationError>;

    /// Cancel an armed one-shot. Unknown handles yield `StaleHandle`.
    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError>;

    /// Show `effective` immediately, outside any schedule. Manual QA only.
    fn present_now(&self, nudge: NudgeType, effective: NudgeType) -> Result<(), NotificationError>;
}

impl<T: NotificationPrimitive + ?Sized> NotificationPrimitive for Arc<T> {
    fn arm_one_shot(
        &self,
        nudge: NudgeType,
        effective: NudgeType,
        fire_at: NaiveDateTime,
    ) -> Result<NotificationHandle, NotificationError> {
        (**self).arm_one_shot(nudge, effective, fire_at)
    }

    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError> {
        (**self).cancel(handle)
    }

    fn present_now(&self, nudge: NudgeType, effective: NudgeType) -> Result<(), NotificationError> {
        (**self).present_now(nudge, effective)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScheduleAction {
    Schedule { at: NaiveDateTime },
    Cancel,
    NoChange,
}

/// Output of one scheduling pass for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    /// Slot owner the pass ran for.
    pub nudge: NudgeType,
    pub action: ScheduleAction,
    /// Substitute shown instead of `nudge`, if any.
    pub resulting_type: Option<NudgeType>,
    /// Eligibility target before backoff.
    pub base_target: Option<NaiveDateTime>,
    pub eligibility: Eligibility,
}

impl ScheduleDecision {
    pub fn effective_type(&self) -> NudgeType {
        self.resulting_type.unwrap_or(self.nudge)
    }

    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        match self.action {
            ScheduleAction::Schedule { at } => Some(at),
            _ => None,
        }
    }
}

pub struct Scheduler<L, P> {
    ledger: L,
    primitive: P,
    backoff: BackoffPolicy,
}

impl<L: LedgerStore, P: NotificationPrimitive> Scheduler<L, P> {
    pub fn new(ledger: L, primitive: P) -> Self {
        Self {
            ledger,
            primitive,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    fn slot_entries(&self, slot: Slot) -> Result<Vec<(NudgeType, LedgerEntry)>, LedgerError> {
        slot.members()
            .iter()
            .map(|nudge| Ok((*nudge, self.ledger.entry(*nudge)?)))
            .collect()
    }

    /// Work out what the slot should look like. Reads only.
    pub fn decide(
        &self,
        slot: Slot,
        facts: &GlobalFacts,
        now: NaiveDateTime,
    ) -> Result<ScheduleDecision, ReconcileError> {
        let entries = self.slot_entries(slot)?;
        let mut history = SlotHistory::from_entries(entries.iter().map(|(_, entry)| entry));
        if slot == Slot::Focus {
            history = history
                .with_focus_completed(self.ledger.global(GlobalKey::LastFocusCompletedDate)?);
        }

        let owner = slot.owner();
        let eligibility = evaluate(owner, facts, &history, now);
        let live: Vec<&(NudgeType, LedgerEntry)> =
            entries.iter().filter(|(_, entry)| entry.is_armed()).collect();

        let decision = match eligibility {
            Eligibility::Ineligible(_) => ScheduleDecision {
                nudge: owner,
                action: if live.is_empty() {
                    ScheduleAction::NoChange
                } else {
                    ScheduleAction::Cancel
                },
                resulting_type: None,
                base_target: None,
                eligibility,
            },
            Eligibility::Eligible { effective, target } => {
                let entry = entries
                    .iter()
                    .find(|(nudge, _)| *nudge == effective)
                    .map(|(_, entry)| entry.clone())
                    .unwrap_or_default();
                let at = self.backoff.apply(effective, &entry, target);
                let unchanged = matches!(
                    live.as_slice(),
                    [(nudge, entry)] if *nudge == effective && entry.scheduled_fire_at == Some(at)
                );
                ScheduleDecision {
                    nudge: owner,
                    action: if unchanged {
                        ScheduleAction::NoChange
                    } else {
                        ScheduleAction::Schedule { at }
                    },
                    resulting_type: eligibility.substitute_for(owner),
                    base_target: Some(target),
                    eligibility,
                }
            }
        };
        Ok(decision)
    }

    /// Carry out a decision.
    ///
    /// Events are appended as side effects happen, so a failure part way
    /// still reports the cancellations that went through.
    pub fn apply(
        &self,
        decision: &ScheduleDecision,
        events: &mut Vec<Event>,
    ) -> Result<(), ReconcileError> {
        let at = match decision.action {
            ScheduleAction::NoChange => return Ok(()),
            ScheduleAction::Cancel => None,
            ScheduleAction::Schedule { at } => Some(at),
        };

        self.cancel_slot(decision.nudge.slot(), events)?;

        let Some(at) = at else {
            return Ok(());
        };
        if let Some(base_target) = decision.base_target.filter(|base| *base != at) {
            events.push(Event::BackoffApplied {
                nudge: decision.effective_type(),
                base_target,
                adjusted_target: at,
            });
        }
        self.arm(decision.nudge, decision.effective_type(), at, events)
            .map(|_| ())
    }

    /// Decide and apply in one go.
    pub fn reschedule(
        &self,
        slot: Slot,
        facts: &GlobalFacts,
        now: NaiveDateTime,
        events: &mut Vec<Event>,
    ) -> Result<ScheduleDecision, ReconcileError> {
        let decision = self.decide(slot, facts, now)?;
        self.apply(&decision, events)?;
        Ok(decision)
    }

    /// Cancel every live handle in the slot and clear it in the ledger.
    ///
    /// Stale handles count as cancelled. Any other cancel failure leaves the
    /// handle recorded, since it may still be live.
    pub fn cancel_slot(&self, slot: Slot, events: &mut Vec<Event>) -> Result<(), ReconcileError> {
        for nudge in slot.members() {
            let mut entry = self.ledger.entry(*nudge)?;
            let Some(handle) = entry.currently_scheduled_id.clone() else {
                continue;
            };
            let stale = match self.primitive.cancel(&handle) {
                Ok(()) => false,
                Err(NotificationError::StaleHandle(_)) => {
                    tracing::warn!(nudge = %nudge, %handle, "stale handle, treating as cancelled");
                    true
                }
                Err(err) => {
                    tracing::warn!(nudge = %nudge, %handle, error = %err, "cancel failed");
                    return Err(err.into());
                }
            };
            entry.clear_handle();
            self.ledger.store(*nudge, &entry)?;
            tracing::info!(nudge = %nudge, %handle, "nudge cancelled");
            events.push(Event::NudgeCancelled {
                nudge: *nudge,
                handle,
                stale,
            });
        }
        Ok(())
    }

    /// Arm `effective` at `at` and record the handle on its entry.
    ///
    /// Callers must have cancelled the slot first.
    pub fn arm(
        &self,
        nudge: NudgeType,
        effective: NudgeType,
        at: NaiveDateTime,
        events: &mut Vec<Event>,
    ) -> Result<NotificationHandle, ReconcileError> {
        let handle = match self.primitive.arm_one_shot(nudge, effective, at) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(nudge = %nudge, effective = %effective, error = %err, "arm failed");
                events.push(Event::ScheduleFailed {
                    nudge,
                    reason: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let recorded = self.ledger.entry(effective).and_then(|mut entry| {
            entry.record_armed(handle.clone(), at);
            self.ledger.store(effective, &entry)
        });
        if let Err(err) = recorded {
            // Unrecorded handles would be invisible to the next pass.
            if let Err(cancel_err) = self.primitive.cancel(&handle) {
                tracing::warn!(%handle, error = %cancel_err, "failed to roll back unrecorded arm");
            }
            return Err(err.into());
        }

        tracing::info!(
            nudge = %nudge,
            effective = %effective,
            fire_at = %at,
            %handle,
            "nudge scheduled"
        );
        events.push(Event::NudgeScheduled {
            nudge,
            effective,
            handle: handle.clone(),
            fire_at: at,
        });
        Ok(handle)
    }
}
