#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use nudge_core::facts::FactsResult;
use nudge_core::{
    Database, FactsProvider, GlobalFacts, NudgeEvent, RecordingPrimitive, ReconcileReport,
    Reconciler, Scheduler, SqliteLedger,
};

/// Facts the test can edit between passes.
#[derive(Default)]
pub struct FixtureFacts(Mutex<GlobalFacts>);

impl FixtureFacts {
    pub fn update(&self, f: impl FnOnce(&mut GlobalFacts)) {
        f(&mut self.0.lock().unwrap());
    }

    pub fn snapshot(&self) -> GlobalFacts {
        self.0.lock().unwrap().clone()
    }
}

impl FactsProvider for FixtureFacts {
    fn global_facts(&self, _now: NaiveDateTime) -> FactsResult {
        Ok(self.snapshot())
    }
}

pub type Engine = Reconciler<SqliteLedger, Arc<RecordingPrimitive>, Arc<FixtureFacts>>;

pub struct Harness {
    pub engine: Engine,
    pub primitive: Arc<RecordingPrimitive>,
    pub facts: Arc<FixtureFacts>,
}

/// Engine over an in-memory SQLite ledger and a recording primitive.
pub fn harness() -> Harness {
    let db = Arc::new(Database::open_memory().unwrap());
    let primitive = Arc::new(RecordingPrimitive::new());
    let facts = Arc::new(FixtureFacts::default());
    let engine = Reconciler::new(
        Scheduler::new(SqliteLedger::new(db), Arc::clone(&primitive)),
        Arc::clone(&facts),
    );
    Harness {
        engine,
        primitive,
        facts,
    }
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One goal per entry, with that many incomplete activities.
pub fn with_goals(facts: &mut GlobalFacts, incomplete: &[u32]) {
    facts.goal_count = incomplete.len() as u32;
    facts.incomplete_activity_count_by_goal = incomplete
        .iter()
        .enumerate()
        .map(|(i, n)| (format!("goal-{i}"), *n))
        .collect();
}

/// Deliver what is due and route each fire back, the way the platform does.
pub fn deliver_due(h: &Harness, now: NaiveDateTime) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for n in h.primitive.deliver_due(now) {
        report.merge(h.engine.on_event(
            NudgeEvent::NotificationFired {
                nudge: n.effective,
                date: n.fire_at.date(),
                handle: Some(n.handle),
            },
            now,
        ));
    }
    report
}
