use chrono::NaiveDateTime;
use clap::Subcommand;
use nudge_core::NudgeType;

use super::{open_engine, print_report};

#[derive(Subcommand)]
pub enum DebugAction {
    /// Show a nudge immediately, bypassing eligibility
    Fire { nudge: NudgeType },
}

pub fn run(action: DebugAction, now: NaiveDateTime) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    match action {
        DebugAction::Fire { nudge } => print_report(&engine.debug_fire(nudge, now)),
    }
}
