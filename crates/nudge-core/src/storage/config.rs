//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Notification permission state
//! - Daily show-up and daily focus reminders (toggle + time offset)
//! - Goal nudge reminder (toggle + time of day)
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::facts::NudgeSettings;
use crate::nudge::{NudgeType, Slot};

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Mirrors the OS permission. When false, arming fails with
    /// `PermissionDenied`.
    #[serde(default = "default_true")]
    pub permission_granted: bool,
}

/// A once-a-day reminder placed at a fixed offset after local midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReminderConfig {
    #[serde(default)]
    pub enabled: bool,
    pub offset_minutes: u32,
}

/// Goal nudge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalNudgeConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Local time of day, `HH:MM`.
    #[serde(default = "default_goal_nudge_time")]
    pub time_of_day: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default = "default_daily_show_up")]
    pub daily_show_up: DailyReminderConfig,
    #[serde(default = "default_daily_focus")]
    pub daily_focus: DailyReminderConfig,
    #[serde(default)]
    pub goal_nudge: GoalNudgeConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_goal_nudge_time() -> String {
    "16:00".into()
}
fn default_daily_show_up() -> DailyReminderConfig {
    DailyReminderConfig {
        enabled: false,
        offset_minutes: 8 * 60,
    }
}
fn default_daily_focus() -> DailyReminderConfig {
    DailyReminderConfig {
        enabled: false,
        offset_minutes: 20 * 60,
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            permission_granted: true,
        }
    }
}

impl Default for GoalNudgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time_of_day: default_goal_nudge_time(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notifications: NotificationsConfig::default(),
            daily_show_up: default_daily_show_up(),
            daily_focus: default_daily_focus(),
            goal_nudge: GoalNudgeConfig::default(),
        }
    }
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| ConfigError::InvalidValue {
            key: "goal_nudge.time_of_day".into(),
            message: format!("'{value}' is not HH:MM ({e})"),
        })
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(Self::path_in(&data_dir()?))
    }

    /// Location of the config file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    /// Load from disk or return (and persist) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing the default there if missing.
    ///
    /// Any other read failure is an error; the file is left untouched.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
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

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        parse_time_of_day(&self.goal_nudge.time_of_day)?;
        for (key, reminder) in [
            ("daily_show_up.offset_minutes", &self.daily_show_up),
            ("daily_focus.offset_minutes", &self.daily_focus),
        ] {
            if reminder.offset_minutes >= 24 * 60 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("{} is past the end of the day", reminder.offset_minutes),
                });
            }
        }
        Ok(())
    }

    /// Project the reminder settings into the shape eligibility consumes.
    pub fn nudge_settings(&self) -> Result<NudgeSettings, ConfigError> {
        Ok(NudgeSettings {
            daily_show_up_enabled: self.daily_show_up.enabled,
            daily_show_up_offset_minutes: self.daily_show_up.offset_minutes,
            daily_focus_enabled: self.daily_focus.enabled,
            daily_focus_offset_minutes: self.daily_focus.offset_minutes,
            goal_nudge_enabled: self.goal_nudge.enabled,
            goal_nudge_time_of_day: parse_time_of_day(&self.goal_nudge.time_of_day)?,
        })
    }

    /// Slot owners whose schedule depends on `key`.
    pub fn affected_nudges(key: &str) -> Vec<NudgeType> {
        let section = key.split('.').next().unwrap_or_default();
        match section {
            "daily_show_up" => vec![NudgeType::DailyShowUp],
            "daily_focus" => vec![NudgeType::DailyFocus],
            "goal_nudge" => vec![NudgeType::GoalNudge],
            "notifications" => Slot::ALL.iter().map(Slot::owner).collect(),
            _ => Vec::new(),
        }
    }
}
