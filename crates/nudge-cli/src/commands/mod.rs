pub mod config;
pub mod debug;
pub mod event;
pub mod facts;
pub mod open;
pub mod status;
pub mod tick;

use std::sync::Arc;

use chrono::NaiveDateTime;
use nudge_core::storage::data_dir;
use nudge_core::{
    Config, Database, LocalFactsProvider, LocalOutbox, ReconcileReport, Reconciler, Scheduler,
    SqliteLedger,
};

pub type Engine = Reconciler<SqliteLedger, LocalOutbox, LocalFactsProvider>;

/// Build the reconciler over the data directory.
pub fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let dir = data_dir()?;
    let config = Config::load_from(&Config::path_in(&dir))?;
    let db = Arc::new(Database::open_at(&dir.join("nudge.db"))?);

    let ledger = SqliteLedger::new(Arc::clone(&db));
    let outbox = LocalOutbox::new(db, config.notifications.permission_granted);
    let scheduler = Scheduler::new(ledger, outbox);
    Ok(Reconciler::new(scheduler, LocalFactsProvider::new(dir)))
}

pub fn parse_at(raw: &str) -> Result<NaiveDateTime, Box<dyn std::error::Error>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| format!("invalid --at {raw:?} (expected \"YYYY-MM-DD HH:MM\"): {e}").into())
}

/// Events go to stdout as JSON lines, slot failures to stderr.
pub fn print_report(report: &ReconcileReport) -> Result<(), Box<dyn std::error::Error>> {
    for event in &report.events {
        println!("{}", serde_json::to_string(event)?);
    }
    for failure in &report.failures {
        eprintln!("warning: {}: {}", failure.nudge, failure.error);
    }
    Ok(())
}
