//! Local stand-in for the goal/activity collaborators.
//!
//! `facts.toml` holds the counts the engine reads:
//!
//! ```toml
//! activity_scheduled_on = "2026-10-18"
//!
//! [goals.learn-rust]
//! incomplete_activities = 3
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::Config;
use crate::error::ConfigError;
use crate::facts::{FactsProvider, FactsResult, GlobalFacts, GoalId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalFacts {
    #[serde(default)]
    pub incomplete_activities: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_show_up_date: Option<NaiveDate>,
    /// Day an activity was last put on the schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_scheduled_on: Option<NaiveDate>,
    #[serde(default)]
    pub goals: BTreeMap<GoalId, GoalFacts>,
}

impl FactsFile {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join("facts.toml")
    }

    /// Load from `path`. A missing file is the empty state.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    pub fn set_goal(&mut self, id: impl Into<GoalId>, incomplete_activities: u32) {
        self.goals.insert(
            id.into(),
            GoalFacts {
                incomplete_activities,
            },
        );
    }

    pub fn remove_goal(&mut self, id: &str) -> bool {
        self.goals.remove(id).is_some()
    }

    /// Project into the snapshot eligibility reads. Settings are left at
    /// their defaults.
    pub fn to_global_facts(&self, now: NaiveDateTime) -> GlobalFacts {
        GlobalFacts {
            last_show_up_date: self.last_show_up_date,
            goal_count: u32::try_from(self.goals.len()).unwrap_or(u32::MAX),
            incomplete_activity_count_by_goal: self
                .goals
                .iter()
                .map(|(id, goal)| (id.clone(), goal.incomplete_activities))
                .collect(),
            any_activity_scheduled_today: self.activity_scheduled_on == Some(now.date()),
            settings: Default::default(),
        }
    }
}

/// Reads `facts.toml` and `config.toml` from one directory on every pass,
/// so edits made between passes are picked up.
pub struct LocalFactsProvider {
    dir: PathBuf,
}

impl LocalFactsProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FactsProvider for LocalFactsProvider {
    fn global_facts(&self, now: NaiveDateTime) -> FactsResult {
        let file = FactsFile::load_from(&FactsFile::path_in(&self.dir))?;
        let config = Config::load_from(&Config::path_in(&self.dir))?;
        let mut facts = file.to_global_facts(now);
        facts.settings = config.nudge_settings()?;
        Ok(facts)
    }
}
