use nudge_core::storage::OutboxRow;
use nudge_core::{LedgerEntry, NudgeState, NudgeType};
use serde::Serialize;

use super::open_engine;

#[derive(Serialize)]
struct NudgeStatus {
    nudge: NudgeType,
    state: NudgeState,
    entry: LedgerEntry,
}

#[derive(Serialize)]
struct Status {
    nudges: Vec<NudgeStatus>,
    outbox: Vec<OutboxRow>,
}

fn date_or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let nudges: Vec<NudgeStatus> = engine
        .ledger_snapshot()?
        .into_iter()
        .map(|(nudge, entry)| NudgeStatus {
            nudge,
            state: NudgeState::of(&entry),
            entry,
        })
        .collect();
    let outbox = engine.scheduler().primitive().list()?;

    if json {
        let status = Status { nudges, outbox };
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{:<16} {:<13} {:<20} {:<11} {:<11} {}",
        "NUDGE", "STATE", "SCHEDULED FOR", "LAST FIRED", "LAST OPEN", "NO-OPEN"
    );
    for s in &nudges {
        println!(
            "{:<16} {:<13} {:<20} {:<11} {:<11} {}",
            s.nudge.as_str(),
            s.state.to_string(),
            date_or_dash(s.entry.scheduled_fire_at),
            date_or_dash(s.entry.last_fired_date),
            date_or_dash(s.entry.last_open_date),
            s.entry.consecutive_no_open_count,
        );
    }
    if !outbox.is_empty() {
        println!();
        println!("outbox:");
        for row in &outbox {
            println!("  {} {} ({})", row.fire_at, row.effective, row.handle);
        }
    }
    Ok(())
}
