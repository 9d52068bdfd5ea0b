//! In-memory notification primitive.
//!
//! Records every arm and cancel so tests and fixtures can assert on what
//! the OS would have been asked to do.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{NotificationHandle, NotificationPrimitive};
use crate::error::NotificationError;
use crate::nudge::NudgeType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmedNotification {
    pub handle: NotificationHandle,
    pub nudge: NudgeType,
    pub effective: NudgeType,
    pub fire_at: NaiveDateTime,
}

#[derive(Debug, Default)]
struct RecordingState {
    armed: BTreeMap<NotificationHandle, ArmedNotification>,
    next_id: u64,
    arms: usize,
    cancels: usize,
    fail_next_arm: Option<NotificationError>,
    fail_next_cancel: Option<NotificationError>,
    presented: Vec<(NudgeType, NudgeType)>,
}

#[derive(Debug, Default)]
pub struct RecordingPrimitive {
    state: Mutex<RecordingState>,
}

impl RecordingPrimitive {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        // A panicking test thread must not hide the recorded state.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Currently armed notifications, ordered by fire time.
    pub fn armed(&self) -> Vec<ArmedNotification> {
        let mut armed: Vec<_> = self.state().armed.values().cloned().collect();
        armed.sort_by_key(|n| n.fire_at);
        armed
    }

    /// Armed notifications shown as `effective`.
    pub fn armed_for(&self, effective: NudgeType) -> Vec<ArmedNotification> {
        self.armed()
            .into_iter()
            .filter(|n| n.effective == effective)
            .collect()
    }

    pub fn arm_count(&self) -> usize {
        self.state().arms
    }

    pub fn cancel_count(&self) -> usize {
        self.state().cancels
    }

    /// `(nudge, effective)` pairs shown through `present_now`.
    pub fn presented(&self) -> Vec<(NudgeType, NudgeType)> {
        self.state().presented.clone()
    }

    pub fn fail_next_arm(&self, err: NotificationError) {
        self.state().fail_next_arm = Some(err);
    }

    pub fn fail_next_cancel(&self, err: NotificationError) {
        self.state().fail_next_cancel = Some(err);
    }

    /// Drop a handle as if the OS had lost it.
    pub fn forget(&self, handle: &NotificationHandle) {
        self.state().armed.remove(handle);
    }

    /// Deliver everything due at or before `now`.
    pub fn deliver_due(&self, now: NaiveDateTime) -> Vec<ArmedNotification> {
        let mut state = self.state();
        let due: Vec<NotificationHandle> = state
            .armed
            .values()
            .filter(|n| n.fire_at <= now)
            .map(|n| n.handle.clone())
            .collect();
        let mut delivered: Vec<ArmedNotification> = due
            .iter()
            .filter_map(|handle| state.armed.remove(handle))
            .collect();
        delivered.sort_by_key(|n| n.fire_at);
        delivered
    }
}

impl NotificationPrimitive for RecordingPrimitive {
    fn arm_one_shot(
        &self,
        nudge: NudgeType,
        effective: NudgeType,
        fire_at: NaiveDateTime,
    ) -> Result<NotificationHandle, NotificationError> {
        let mut state = self.state();
        if let Some(err) = state.fail_next_arm.take() {
            return Err(err);
        }
        state.next_id += 1;
        state.arms += 1;
        let handle = NotificationHandle::new(format!("rec-{}", state.next_id));
        state.armed.insert(
            handle.clone(),
            ArmedNotification {
                handle: handle.clone(),
                nudge,
                effective,
                fire_at,
            },
        );
        Ok(handle)
    }

    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError> {
        let mut state = self.state();
        if let Some(err) = state.fail_next_cancel.take() {
            return Err(err);
        }
        state.cancels += 1;
        match state.armed.remove(handle) {
            Some(_) => Ok(()),
            None => Err(NotificationError::StaleHandle(handle.clone())),
        }
    }

    fn present_now(&self, nudge: NudgeType, effective: NudgeType) -> Result<(), NotificationError> {
        let mut state = self.state();
        if let Some(err) = state.fail_next_arm.take() {
            return Err(err);
        }
        state.presented.push((nudge, effective));
        Ok(())
    }
}
