//! Ledger persisted in the kv table.
//!
//! Keys:
//! - `ledger.<nudgeType>`: [`LedgerEntry`] as JSON
//! - `global.<key>`: `YYYY-MM-DD`

use std::sync::Arc;

use chrono::NaiveDate;

use super::{GlobalKey, LedgerEntry, LedgerStore};
use crate::error::LedgerError;
use crate::nudge::NudgeType;
use crate::storage::Database;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteLedger {
    db: Arc<Database>,
}

impl SqliteLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    fn entry_key(nudge: NudgeType) -> String {
        format!("ledger.{}", nudge.as_str())
    }

    fn global_key(key: GlobalKey) -> String {
        format!("global.{}", key.as_str())
    }
}

impl LedgerStore for SqliteLedger {
    fn load(&self, nudge: NudgeType) -> Result<Option<LedgerEntry>, LedgerError> {
        let key = Self::entry_key(nudge);
        let Some(raw) = self.db.kv_get(&key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| LedgerError::Corrupt {
                key,
                message: e.to_string(),
            })
    }

    fn store(&self, nudge: NudgeType, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let key = Self::entry_key(nudge);
        let raw = serde_json::to_string(entry).map_err(|e| LedgerError::Corrupt {
            key: key.clone(),
            message: e.to_string(),
        })?;
        self.db.kv_set(&key, &raw)?;
        Ok(())
    }

    fn global(&self, key: GlobalKey) -> Result<Option<NaiveDate>, LedgerError> {
        let key = Self::global_key(key);
        let Some(raw) = self.db.kv_get(&key)? else {
            return Ok(None);
        };
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .map_err(|e| LedgerError::Corrupt {
                key,
                message: format!("{raw:?}: {e}"),
            })
    }

    fn set_global(&self, key: GlobalKey, date: NaiveDate) -> Result<(), LedgerError> {
        self.db
            .kv_set(&Self::global_key(key), &date.format(DATE_FORMAT).to_string())?;
        Ok(())
    }
}
