mod config;
pub mod database;
mod facts_file;
pub mod migrations;
mod outbox;

pub use config::{Config, DailyReminderConfig, GoalNudgeConfig, NotificationsConfig};
pub use database::Database;
pub use facts_file::{FactsFile, GoalFacts, LocalFactsProvider};
pub use outbox::{LocalOutbox, OutboxRow};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory.
///
/// `NUDGE_DATA_DIR` wins when set. Otherwise `~/.config/nudge[-dev]/`,
/// with `NUDGE_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("NUDGE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("NUDGE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("nudge-dev")
            } else {
                base_dir.join("nudge")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
