use chrono::NaiveDateTime;
use clap::Subcommand;
use nudge_core::{Config, NudgeEvent, NudgeType, Slot};

use super::{open_engine, print_report};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "goal_nudge.time_of_day")
        key: String,
    },
    /// Set a config value and reschedule the affected nudges
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

fn reschedule(nudges: &[NudgeType], now: NaiveDateTime) -> Result<(), Box<dyn std::error::Error>> {
    if nudges.is_empty() {
        return Ok(());
    }
    let engine = open_engine()?;
    for nudge in nudges {
        let report = engine.on_event(NudgeEvent::SettingsChanged { nudge: *nudge }, now);
        print_report(&report)?;
    }
    Ok(())
}

pub fn run(action: ConfigAction, now: NaiveDateTime) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            eprintln!("ok");
            reschedule(&Config::affected_nudges(&key), now)?;
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            eprintln!("config reset to defaults");
            let owners: Vec<NudgeType> = Slot::ALL.iter().map(Slot::owner).collect();
            reschedule(&owners, now)?;
        }
    }
    Ok(())
}
