use chrono::NaiveDateTime;
use nudge_core::NudgeEvent;

use super::{open_engine, print_report};

/// Deliver every due outbox row and route each back as a fire.
pub fn run(now: NaiveDateTime) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let due = engine.scheduler().primitive().take_due(now)?;
    for row in due {
        tracing::info!(
            nudge = %row.effective,
            handle = %row.handle,
            fire_at = %row.fire_at,
            "delivering"
        );
        let report = engine.on_event(
            NudgeEvent::NotificationFired {
                nudge: row.effective,
                date: row.fire_at.date(),
                handle: Some(row.handle),
            },
            now,
        );
        print_report(&report)?;
    }
    Ok(())
}
