//! Reconciliation entry point.
//!
//! Every external trigger lands in [`Reconciler::on_event`]. Every ledger
//! write for a slot, passes included, happens under that slot's lock;
//! different slots may reconcile concurrently. Global dates have a lock of
//! their own. A failing slot is reported in the pass report and never
//! stops the remaining slots.
//!
//! ## No-open detection
//!
//! A fired nudge is only known to have gone unopened when a later
//! scheduling pass for its slot finds `last_fired > last_open`. That pass
//! bumps `consecutive_no_open_count` once per fire date. No background timer
//! is needed to detect silence.

use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, ReconcileError};
use crate::events::Event;
use crate::facts::{FactsProvider, GlobalFacts};
use crate::ledger::{GlobalKey, LedgerEntry, LedgerStore};
use crate::nudge::{NudgeType, Slot};
use crate::scheduler::{NotificationHandle, NotificationPrimitive, ScheduleDecision, Scheduler};

/// Triggers routed into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NudgeEvent {
    SettingsChanged {
        nudge: NudgeType,
    },
    AppForegrounded,
    NotificationFired {
        nudge: NudgeType,
        date: NaiveDate,
        /// Handle of the delivered one-shot, when the platform reports it.
        #[serde(default)]
        handle: Option<NotificationHandle>,
    },
    NotificationOpened {
        nudge: NudgeType,
        date: NaiveDate,
    },
    ShowUpRecorded {
        date: NaiveDate,
    },
    FocusSessionCompleted {
        date: NaiveDate,
    },
}

/// A slot whose pass failed.
#[derive(Debug)]
pub struct SlotFailure {
    pub nudge: NudgeType,
    pub error: ReconcileError,
}

/// What one event did.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub decisions: Vec<ScheduleDecision>,
    pub events: Vec<Event>,
    pub failures: Vec<SlotFailure>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn decision_for(&self, nudge: NudgeType) -> Option<&ScheduleDecision> {
        self.decisions.iter().find(|d| d.nudge == nudge)
    }

    pub fn merge(&mut self, other: ReconcileReport) {
        self.decisions.extend(other.decisions);
        self.events.extend(other.events);
        self.failures.extend(other.failures);
    }
}

pub struct Reconciler<L, P, F> {
    scheduler: Scheduler<L, P>,
    facts: F,
    slot_locks: [Mutex<()>; 3],
    globals_lock: Mutex<()>,
}

fn slot_index(slot: Slot) -> usize {
    match slot {
        Slot::Morning => 0,
        Slot::Focus => 1,
        Slot::Goal => 2,
    }
}

impl<L, P, F> Reconciler<L, P, F>
where
    L: LedgerStore,
    P: NotificationPrimitive,
    F: FactsProvider,
{
    pub fn new(scheduler: Scheduler<L, P>, facts: F) -> Self {
        Self {
            scheduler,
            facts,
            slot_locks: Default::default(),
            globals_lock: Mutex::new(()),
        }
    }

    pub fn scheduler(&self) -> &Scheduler<L, P> {
        &self.scheduler
    }

    fn lock(&self, slot: Slot) -> MutexGuard<'_, ()> {
        // The guard protects no data, so a poisoned lock is still usable.
        self.slot_locks[slot_index(slot)]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle one trigger to completion.
    pub fn on_event(&self, event: NudgeEvent, now: NaiveDateTime) -> ReconcileReport {
        tracing::debug!(?event, %now, "reconciler event");
        let mut report = ReconcileReport::default();
        match event {
            NudgeEvent::SettingsChanged { nudge } => {
                self.reconcile_slots(&[nudge.slot()], now, &mut report);
            }
            NudgeEvent::AppForegrounded => {
                self.reconcile_slots(&Slot::ALL, now, &mut report);
            }
            NudgeEvent::NotificationFired {
                nudge,
                date,
                handle,
            } => {
                let result = self.record_fired(nudge, date, handle.as_ref(), &mut report.events);
                self.report_failure(nudge, result, &mut report);
            }
            NudgeEvent::NotificationOpened { nudge, date } => {
                let result = {
                    let _guard = self.lock(nudge.slot());
                    self.update_entry(nudge, |entry| entry.record_opened(date))
                };
                match result {
                    Ok(_) => {
                        tracing::info!(nudge = %nudge, %date, "nudge opened, backoff reset");
                        report.events.push(Event::NudgeOpened { nudge, date });
                    }
                    Err(err) => self.report_failure(nudge, Err(err.into()), &mut report),
                }
            }
            NudgeEvent::ShowUpRecorded { date } => {
                match self.advance_global(GlobalKey::LastShowUpDate, date) {
                    Ok(()) => {
                        report.events.push(Event::ShowUpRecorded { date });
                        self.reconcile_slots(&[Slot::Morning, Slot::Goal], now, &mut report);
                    }
                    Err(err) => {
                        self.report_failure(NudgeType::DailyShowUp, Err(err.into()), &mut report)
                    }
                }
            }
            NudgeEvent::FocusSessionCompleted { date } => {
                match self.advance_global(GlobalKey::LastFocusCompletedDate, date) {
                    Ok(()) => {
                        report.events.push(Event::FocusSessionRecorded { date });
                        self.reconcile_slots(&[Slot::Focus], now, &mut report);
                    }
                    Err(err) => {
                        self.report_failure(NudgeType::DailyFocus, Err(err.into()), &mut report)
                    }
                }
            }
        }
        report
    }

    /// Handle queued triggers in order. Each runs to completion before the
    /// next starts.
    pub fn drain(
        &self,
        events: impl IntoIterator<Item = (NudgeEvent, NaiveDateTime)>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for (event, now) in events {
            report.merge(self.on_event(event, now));
        }
        report
    }

    /// Show `nudge` right now, bypassing eligibility, then run the fire
    /// path so open/no-open bookkeeping applies as for a real delivery.
    ///
    /// The slot's live schedule, if any, is left armed.
    pub fn debug_fire(&self, nudge: NudgeType, now: NaiveDateTime) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let owner = nudge.slot().owner();
        if let Err(err) = self.scheduler.primitive().present_now(owner, nudge) {
            tracing::warn!(nudge = %nudge, error = %err, "debug fire failed");
            report.events.push(Event::ScheduleFailed {
                nudge,
                reason: err.to_string(),
            });
            self.report_failure(nudge, Err(err.into()), &mut report);
            return report;
        }
        let date = now.date();
        let result = {
            let _guard = self.lock(nudge.slot());
            self.update_entry(nudge, |entry| entry.note_fired(date))
        };
        match result {
            Ok(_) => {
                tracing::info!(nudge = %nudge, %date, "debug fire");
                report.events.push(Event::NudgeFired { nudge, date });
            }
            Err(err) => self.report_failure(nudge, Err(err.into()), &mut report),
        }
        report
    }

    /// Current ledger entries, one per type.
    pub fn ledger_snapshot(&self) -> Result<Vec<(NudgeType, LedgerEntry)>, LedgerError> {
        NudgeType::ALL
            .iter()
            .map(|nudge| Ok((*nudge, self.scheduler.ledger().entry(*nudge)?)))
            .collect()
    }

    /// Facts for this pass, with the ledger's show-up date overlaid.
    pub fn current_facts(&self, now: NaiveDateTime) -> Result<GlobalFacts, ReconcileError> {
        let mut facts = self
            .facts
            .global_facts(now)
            .map_err(|e| ReconcileError::Facts(e.to_string()))?;
        let recorded = self.scheduler.ledger().global(GlobalKey::LastShowUpDate)?;
        facts.last_show_up_date = facts.last_show_up_date.max(recorded);
        Ok(facts)
    }

    fn reconcile_slots(&self, slots: &[Slot], now: NaiveDateTime, report: &mut ReconcileReport) {
        let facts = match self.current_facts(now) {
            Ok(facts) => facts,
            Err(err) => {
                tracing::warn!(error = %err, "facts unavailable, skipping pass");
                for slot in slots {
                    report.failures.push(SlotFailure {
                        nudge: slot.owner(),
                        error: ReconcileError::Facts(err.to_string()),
                    });
                }
                return;
            }
        };

        for slot in slots {
            let _guard = self.lock(*slot);
            match self.pass(*slot, &facts, now, &mut report.events) {
                Ok(decision) => report.decisions.push(decision),
                Err(err) => {
                    tracing::warn!(nudge = %slot.owner(), error = %err, "reconciliation failed");
                    report.failures.push(SlotFailure {
                        nudge: slot.owner(),
                        error: err,
                    });
                }
            }
        }
    }

    /// One scheduling pass. The caller holds the slot lock.
    fn pass(
        &self,
        slot: Slot,
        facts: &GlobalFacts,
        now: NaiveDateTime,
        events: &mut Vec<Event>,
    ) -> Result<ScheduleDecision, ReconcileError> {
        let ledger = self.scheduler.ledger();
        for nudge in slot.members() {
            let mut entry = ledger.entry(*nudge)?;
            if entry.observe_unopened_fire() {
                ledger.store(*nudge, &entry)?;
                tracing::info!(
                    nudge = %nudge,
                    count = entry.consecutive_no_open_count,
                    "unopened fire recorded"
                );
                events.push(Event::NoOpenRecorded {
                    nudge: *nudge,
                    consecutive_no_open_count: entry.consecutive_no_open_count,
                });
            }
        }
        self.scheduler.reschedule(slot, facts, now, events)
    }

    fn record_fired(
        &self,
        nudge: NudgeType,
        date: NaiveDate,
        handle: Option<&NotificationHandle>,
        events: &mut Vec<Event>,
    ) -> Result<(), ReconcileError> {
        let _guard = self.lock(nudge.slot());
        self.update_entry(nudge, |entry| {
            // A delivery for an older, replaced instance must not clear the
            // live one. Without a handle, only an instance due on or before
            // `date` can be the one delivered.
            let spent = match handle {
                Some(h) => entry.currently_scheduled_id.as_ref() == Some(h),
                None => entry.scheduled_fire_at.map(|at| at.date()) <= Some(date),
            };
            if spent {
                entry.record_fired(date);
            } else {
                entry.note_fired(date);
            }
        })?;
        tracing::info!(nudge = %nudge, %date, "nudge fired");
        events.push(Event::NudgeFired { nudge, date });
        Ok(())
    }

    fn update_entry(
        &self,
        nudge: NudgeType,
        update: impl FnOnce(&mut LedgerEntry),
    ) -> Result<LedgerEntry, LedgerError> {
        let ledger = self.scheduler.ledger();
        let mut entry = ledger.entry(nudge)?;
        update(&mut entry);
        ledger.store(nudge, &entry)?;
        Ok(entry)
    }

    /// Dates only move forward.
    fn advance_global(&self, key: GlobalKey, date: NaiveDate) -> Result<(), LedgerError> {
        let _guard = self
            .globals_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let ledger = self.scheduler.ledger();
        let current = ledger.global(key)?;
        if current.map_or(true, |existing| date > existing) {
            ledger.set_global(key, date)?;
        }
        Ok(())
    }

    fn report_failure(
        &self,
        nudge: NudgeType,
        result: Result<(), ReconcileError>,
        report: &mut ReconcileReport,
    ) {
        if let Err(error) = result {
            tracing::warn!(nudge = %nudge, error = %error, "event handling failed");
            report.failures.push(SlotFailure { nudge, error });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration as StdDuration;

    use crate::error::NotificationError;
    use crate::facts::{FactsResult, NudgeSettings, StaticFacts};
    use crate::ledger::MemoryLedger;
    use crate::scheduler::{RecordingPrimitive, ScheduleAction};

    type TestReconciler = Reconciler<MemoryLedger, RecordingPrimitive, StaticFacts>;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn facts() -> GlobalFacts {
        let mut facts = GlobalFacts {
            goal_count: 1,
            settings: NudgeSettings {
                daily_show_up_enabled: true,
                daily_focus_enabled: true,
                goal_nudge_enabled: true,
                ..Default::default()
            },
            ..Default::default()
        };
        facts
            .incomplete_activity_count_by_goal
            .insert("goal-1".into(), 2);
        facts
    }

    fn reconciler() -> TestReconciler {
        Reconciler::new(
            Scheduler::new(MemoryLedger::new(), RecordingPrimitive::new()),
            StaticFacts(facts()),
        )
    }

    fn goal_entry(r: &TestReconciler) -> LedgerEntry {
        r.scheduler().ledger().entry(NudgeType::GoalNudge).unwrap()
    }

    fn fire_goal(r: &TestReconciler, date: &str) {
        let handle = goal_entry(r).currently_scheduled_id;
        let report = r.on_event(
            NudgeEvent::NotificationFired {
                nudge: NudgeType::GoalNudge,
                date: d(date),
                handle,
            },
            at(&format!("{date} 16:00")),
        );
        assert!(report.is_clean());
    }

    #[test]
    fn foreground_schedules_every_slot() {
        let r = reconciler();
        let report = r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));

        assert!(report.is_clean());
        assert_eq!(report.decisions.len(), 3);
        assert_eq!(
            report.decision_for(NudgeType::GoalNudge).unwrap().scheduled_at(),
            Some(at("2026-10-18 16:00"))
        );
        assert_eq!(
            report.decision_for(NudgeType::DailyShowUp).unwrap().scheduled_at(),
            Some(at("2026-10-19 08:00"))
        );
        assert_eq!(
            report.decision_for(NudgeType::DailyFocus).unwrap().scheduled_at(),
            Some(at("2026-10-19 20:00"))
        );
        assert_eq!(r.scheduler().primitive().armed().len(), 3);
    }

    #[test]
    fn unopened_fire_counts_once() {
        let r = reconciler();
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));
        fire_goal(&r, "2026-10-18");
        assert!(!goal_entry(&r).is_armed());

        let report = r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 17:00"));
        assert!(report.events.iter().any(|e| matches!(
            e,
            Event::NoOpenRecorded {
                nudge: NudgeType::GoalNudge,
                consecutive_no_open_count: 1
            }
        )));
        assert_eq!(
            report.decision_for(NudgeType::GoalNudge).unwrap().scheduled_at(),
            Some(at("2026-10-19 16:00"))
        );

        let again = r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 17:30"));
        assert!(!again
            .events
            .iter()
            .any(|e| matches!(e, Event::NoOpenRecorded { .. })));
        assert_eq!(goal_entry(&r).consecutive_no_open_count, 1);
        assert_eq!(
            again.decision_for(NudgeType::GoalNudge).unwrap().action,
            ScheduleAction::NoChange
        );
    }

    #[test]
    fn open_resets_backoff() {
        let r = reconciler();
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-17 07:00"));
        fire_goal(&r, "2026-10-17");
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-17 17:00"));
        fire_goal(&r, "2026-10-18");

        let backed_off = r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 17:00"));
        assert_eq!(goal_entry(&r).consecutive_no_open_count, 2);
        assert_eq!(
            backed_off.decision_for(NudgeType::GoalNudge).unwrap().scheduled_at(),
            Some(at("2026-10-20 16:00"))
        );

        r.on_event(
            NudgeEvent::NotificationOpened {
                nudge: NudgeType::GoalNudge,
                date: d("2026-10-18"),
            },
            at("2026-10-18 18:00"),
        );
        assert_eq!(goal_entry(&r).consecutive_no_open_count, 0);

        let reset = r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 18:05"));
        assert_eq!(
            reset.decision_for(NudgeType::GoalNudge).unwrap().scheduled_at(),
            Some(at("2026-10-19 16:00"))
        );
        assert_eq!(r.scheduler().primitive().armed_for(NudgeType::GoalNudge).len(), 1);
    }

    #[test]
    fn show_up_withdraws_todays_goal_nudge() {
        let r = reconciler();
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));
        assert!(goal_entry(&r).is_armed());

        let report = r.on_event(
            NudgeEvent::ShowUpRecorded {
                date: d("2026-10-18"),
            },
            at("2026-10-18 09:00"),
        );

        assert!(report.is_clean());
        assert!(report
            .events
            .contains(&Event::ShowUpRecorded { date: d("2026-10-18") }));
        assert_eq!(
            report.decision_for(NudgeType::GoalNudge).unwrap().action,
            ScheduleAction::Cancel
        );
        assert!(!goal_entry(&r).is_armed());
        assert_eq!(
            r.scheduler().ledger().global(GlobalKey::LastShowUpDate).unwrap(),
            Some(d("2026-10-18"))
        );
        // Tomorrow's morning reminder is untouched.
        assert_eq!(
            report.decision_for(NudgeType::DailyShowUp).unwrap().action,
            ScheduleAction::NoChange
        );
    }

    #[test]
    fn failing_slot_does_not_block_the_others() {
        let r = reconciler();
        r.scheduler()
            .primitive()
            .fail_next_arm(NotificationError::PermissionDenied {
                nudge: NudgeType::DailyShowUp,
            });

        let report = r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].nudge, NudgeType::DailyShowUp);
        assert!(report.failures[0].error.is_permission_denied());
        assert_eq!(report.decisions.len(), 2);
        assert_eq!(r.scheduler().primitive().armed().len(), 2);
    }

    struct OfflineFacts;

    impl FactsProvider for OfflineFacts {
        fn global_facts(&self, _now: NaiveDateTime) -> FactsResult {
            Err("goal store offline".into())
        }
    }

    #[test]
    fn facts_failure_is_reported_per_slot() {
        let r = Reconciler::new(
            Scheduler::new(MemoryLedger::new(), RecordingPrimitive::new()),
            OfflineFacts,
        );
        let report = r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));

        assert_eq!(report.failures.len(), 3);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, ReconcileError::Facts(_))));
        assert!(r.scheduler().primitive().armed().is_empty());
    }

    #[test]
    fn late_fire_of_replaced_handle_keeps_live_one() {
        let r = reconciler();
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));
        let live = goal_entry(&r).currently_scheduled_id;

        r.on_event(
            NudgeEvent::NotificationFired {
                nudge: NudgeType::GoalNudge,
                date: d("2026-10-18"),
                handle: Some(NotificationHandle::new("replaced")),
            },
            at("2026-10-18 08:00"),
        );

        let entry = goal_entry(&r);
        assert_eq!(entry.currently_scheduled_id, live);
        assert_eq!(entry.last_fired_date, Some(d("2026-10-18")));
    }

    #[test]
    fn late_fire_without_handle_keeps_newer_instance() {
        let r = reconciler();
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));

        // Delivered on time, but the callback is held back past a pass that
        // arms tomorrow's instance.
        let delivered = r.scheduler().primitive().deliver_due(at("2026-10-18 16:00"));
        assert_eq!(delivered.len(), 1);
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 16:30"));
        let tomorrow = goal_entry(&r).currently_scheduled_id;
        assert!(tomorrow.is_some());

        r.on_event(
            NudgeEvent::NotificationFired {
                nudge: NudgeType::GoalNudge,
                date: d("2026-10-18"),
                handle: None,
            },
            at("2026-10-18 16:40"),
        );
        let entry = goal_entry(&r);
        assert_eq!(entry.currently_scheduled_id, tomorrow);
        assert_eq!(entry.last_fired_date, Some(d("2026-10-18")));

        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 16:45"));
        let armed = r.scheduler().primitive().armed_for(NudgeType::GoalNudge);
        assert_eq!(armed.len(), 1);
        assert_eq!(Some(armed[0].handle.clone()), tomorrow);
        assert_eq!(armed[0].fire_at, at("2026-10-19 16:00"));
    }

    #[test]
    fn fire_without_handle_spends_due_instance() {
        let r = reconciler();
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));
        r.scheduler().primitive().deliver_due(at("2026-10-18 16:00"));

        r.on_event(
            NudgeEvent::NotificationFired {
                nudge: NudgeType::GoalNudge,
                date: d("2026-10-18"),
                handle: None,
            },
            at("2026-10-18 16:00"),
        );

        let entry = goal_entry(&r);
        assert!(!entry.is_armed());
        assert_eq!(entry.last_fired_date, Some(d("2026-10-18")));
    }

    /// Signals the first time `nudge` is loaded, then stalls so another
    /// thread can race the caller.
    struct StallingLedger {
        inner: MemoryLedger,
        nudge: NudgeType,
        loaded: Mutex<Option<mpsc::Sender<()>>>,
    }

    impl LedgerStore for StallingLedger {
        fn load(&self, nudge: NudgeType) -> Result<Option<LedgerEntry>, LedgerError> {
            let entry = self.inner.load(nudge)?;
            if nudge == self.nudge {
                if let Some(tx) = self.loaded.lock().unwrap().take() {
                    tx.send(()).unwrap();
                    thread::sleep(StdDuration::from_millis(50));
                }
            }
            Ok(entry)
        }

        fn store(&self, nudge: NudgeType, entry: &LedgerEntry) -> Result<(), LedgerError> {
            self.inner.store(nudge, entry)
        }

        fn global(&self, key: GlobalKey) -> Result<Option<NaiveDate>, LedgerError> {
            self.inner.global(key)
        }

        fn set_global(&self, key: GlobalKey, date: NaiveDate) -> Result<(), LedgerError> {
            self.inner.set_global(key, date)
        }
    }

    #[test]
    fn open_during_pass_is_not_lost() {
        let (tx, rx) = mpsc::channel();
        let ledger = StallingLedger {
            inner: MemoryLedger::new(),
            nudge: NudgeType::GoalNudge,
            loaded: Mutex::new(Some(tx)),
        };
        ledger
            .inner
            .store(
                NudgeType::GoalNudge,
                &LedgerEntry {
                    consecutive_no_open_count: 1,
                    last_fired_date: Some(d("2026-10-17")),
                    ..Default::default()
                },
            )
            .unwrap();
        let r = Reconciler::new(
            Scheduler::new(ledger, RecordingPrimitive::new()),
            StaticFacts(facts()),
        );

        let r = &r;
        thread::scope(|s| {
            s.spawn(move || {
                rx.recv().unwrap();
                r.on_event(
                    NudgeEvent::NotificationOpened {
                        nudge: NudgeType::GoalNudge,
                        date: d("2026-10-17"),
                    },
                    at("2026-10-18 09:00"),
                );
            });
            let report = r.on_event(
                NudgeEvent::SettingsChanged {
                    nudge: NudgeType::GoalNudge,
                },
                at("2026-10-18 09:00"),
            );
            assert!(report.is_clean());
        });

        let entry = r.scheduler().ledger().entry(NudgeType::GoalNudge).unwrap();
        assert_eq!(entry.consecutive_no_open_count, 0);
        assert_eq!(entry.last_open_date, Some(d("2026-10-17")));
        assert!(entry.is_armed());
    }

    #[test]
    fn debug_fire_leaves_schedule_armed() {
        let r = reconciler();
        r.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 07:00"));

        let report = r.debug_fire(NudgeType::GoalNudge, at("2026-10-18 10:00"));

        assert!(report.is_clean());
        assert_eq!(
            r.scheduler().primitive().presented(),
            vec![(NudgeType::GoalNudge, NudgeType::GoalNudge)]
        );
        let entry = goal_entry(&r);
        assert!(entry.is_armed());
        assert_eq!(entry.last_fired_date, Some(d("2026-10-18")));
    }

    #[test]
    fn drain_runs_events_in_order() {
        let r = reconciler();
        let report = r.drain([
            (NudgeEvent::AppForegrounded, at("2026-10-18 07:00")),
            (
                NudgeEvent::FocusSessionCompleted {
                    date: d("2026-10-18"),
                },
                at("2026-10-18 21:00"),
            ),
        ]);

        assert!(report.is_clean());
        assert!(report
            .events
            .contains(&Event::FocusSessionRecorded { date: d("2026-10-18") }));
        let focus = r.scheduler().primitive().armed_for(NudgeType::DailyFocus);
        assert_eq!(focus.len(), 1);
        assert_eq!(focus[0].fire_at, at("2026-10-19 20:00"));
    }
}
