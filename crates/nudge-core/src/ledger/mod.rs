//! Behavioral ledger.
//!
//! One [`LedgerEntry`] per nudge type plus a couple of global dates. The
//! ledger is pure storage: policy lives in eligibility, backoff and the
//! reconciler. Entries are created lazily on first evaluation and are never
//! deleted, only mutated.

mod sqlite;

pub use sqlite::SqliteLedger;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::nudge::NudgeType;
use crate::scheduler::NotificationHandle;

/// Persisted behavioral history of one nudge type.
///
/// `currently_scheduled_id` is `Some` iff a one-shot is armed for this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(default)]
    pub last_scheduled_date: Option<NaiveDate>,
    /// Exact fire time of the live handle.
    #[serde(default)]
    pub scheduled_fire_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_fired_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_open_date: Option<NaiveDate>,
    #[serde(default)]
    pub consecutive_no_open_count: u32,
    /// Fire date most recently counted as unopened.
    #[serde(default)]
    pub last_no_open_date: Option<NaiveDate>,
    #[serde(default)]
    pub currently_scheduled_id: Option<NotificationHandle>,
}

impl LedgerEntry {
    pub fn is_armed(&self) -> bool {
        self.currently_scheduled_id.is_some()
    }

    /// Date of the last scheduled occurrence that actually fired.
    ///
    /// A scheduled date that was withdrawn before firing does not count, so
    /// cancelling and re-enabling a reminder never skips a day.
    pub fn settled_date(&self) -> Option<NaiveDate> {
        let scheduled = self.last_scheduled_date?;
        let fired = self.last_fired_date?;
        (fired >= scheduled).then_some(scheduled)
    }

    /// Whether the last fire has gone without an open.
    pub fn last_fire_unopened(&self) -> bool {
        match (self.last_fired_date, self.last_open_date) {
            (Some(fired), Some(opened)) => fired > opened,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Count the last fire as ignored, at most once per fire date.
    ///
    /// Returns `true` when the counter moved.
    pub fn observe_unopened_fire(&mut self) -> bool {
        if !self.last_fire_unopened() || self.last_no_open_date == self.last_fired_date {
            return false;
        }
        self.consecutive_no_open_count = self.consecutive_no_open_count.saturating_add(1);
        self.last_no_open_date = self.last_fired_date;
        true
    }

    /// A delivery happened on `date`. The live handle, if any, is kept.
    pub fn note_fired(&mut self, date: NaiveDate) {
        self.last_fired_date = Some(self.last_fired_date.map_or(date, |d| d.max(date)));
    }

    /// The armed one-shot has been delivered; its handle is spent.
    pub fn record_fired(&mut self, date: NaiveDate) {
        self.note_fired(date);
        self.clear_handle();
    }

    /// An open resets backoff immediately.
    pub fn record_opened(&mut self, date: NaiveDate) {
        self.last_open_date = Some(self.last_open_date.map_or(date, |d| d.max(date)));
        self.consecutive_no_open_count = 0;
    }

    pub fn record_armed(&mut self, handle: NotificationHandle, fire_at: NaiveDateTime) {
        self.currently_scheduled_id = Some(handle);
        self.scheduled_fire_at = Some(fire_at);
        self.last_scheduled_date = Some(fire_at.date());
    }

    pub fn clear_handle(&mut self) {
        self.currently_scheduled_id = None;
        self.scheduled_fire_at = None;
    }
}

/// Global, type-independent facts kept by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GlobalKey {
    LastShowUpDate,
    LastFocusCompletedDate,
}

impl GlobalKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalKey::LastShowUpDate => "lastShowUpDate",
            GlobalKey::LastFocusCompletedDate => "lastFocusCompletedDate",
        }
    }
}

/// Key/value persistence for the ledger.
///
/// Implementations must be safe to share; the reconciler serializes writes
/// per type.
pub trait LedgerStore: Send + Sync {
    fn load(&self, nudge: NudgeType) -> Result<Option<LedgerEntry>, LedgerError>;

    fn store(&self, nudge: NudgeType, entry: &LedgerEntry) -> Result<(), LedgerError>;

    fn global(&self, key: GlobalKey) -> Result<Option<NaiveDate>, LedgerError>;

    fn set_global(&self, key: GlobalKey, date: NaiveDate) -> Result<(), LedgerError>;

    /// Load the entry, creating and persisting an empty one on first use.
    fn entry(&self, nudge: NudgeType) -> Result<LedgerEntry, LedgerError> {
        match self.load(nudge)? {
            Some(entry) => Ok(entry),
            None => {
                let entry = LedgerEntry::default();
                self.store(nudge, &entry)?;
                Ok(entry)
            }
        }
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn load(&self, nudge: NudgeType) -> Result<Option<LedgerEntry>, LedgerError> {
        (**self).load(nudge)
    }

    fn store(&self, nudge: NudgeType, entry: &LedgerEntry) -> Result<(), LedgerError> {
        (**self).store(nudge, entry)
    }

    fn global(&self, key: GlobalKey) -> Result<Option<NaiveDate>, LedgerError> {
        (**self).global(key)
    }

    fn set_global(&self, key: GlobalKey, date: NaiveDate) -> Result<(), LedgerError> {
        (**self).set_global(key, date)
    }
}

/// In-memory ledger, used by tests and fixtures.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<NudgeType, LedgerEntry>>,
    globals: Mutex<HashMap<GlobalKey, NaiveDate>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedger {
    fn load(&self, nudge: NudgeType) -> Result<Option<LedgerEntry>, LedgerError> {
        let entries = self.entries.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(entries.get(&nudge).cloned())
    }

    fn store(&self, nudge: NudgeType, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock().map_err(|_| LedgerError::Poisoned)?;
        entries.insert(nudge, entry.clone());
        Ok(())
    }

    fn global(&self, key: GlobalKey) -> Result<Option<NaiveDate>, LedgerError> {
        let globals = self.globals.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(globals.get(&key).copied())
    }

    fn set_global(&self, key: GlobalKey, date: NaiveDate) -> Result<(), LedgerError> {
        let mut globals = self.globals.lock().map_err(|_| LedgerError::Poisoned)?;
        globals.insert(key, date);
        Ok(())
    }
}
