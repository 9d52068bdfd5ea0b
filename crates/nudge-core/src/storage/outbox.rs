//! Local outbox: the notification primitive of the CLI.
//!
//! Armed one-shots are rows in `scheduled_notifications`. Nothing fires on
//! its own; a caller polls [`LocalOutbox::take_due`] and routes each row
//! back into the reconciler as a fired notification.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::error::{DatabaseError, NotificationError};
use crate::nudge::NudgeType;
use crate::scheduler::{NotificationHandle, NotificationPrimitive};

const FIRE_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One armed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboxRow {
    pub handle: NotificationHandle,
    pub nudge: NudgeType,
    pub effective: NudgeType,
    pub fire_at: NaiveDateTime,
    pub armed_at: NaiveDateTime,
}

pub struct LocalOutbox {
    db: Arc<Database>,
    permission_granted: bool,
}

impl LocalOutbox {
    pub fn new(db: Arc<Database>, permission_granted: bool) -> Self {
        Self {
            db,
            permission_granted,
        }
    }

    /// All armed rows, earliest first.
    pub fn list(&self) -> Result<Vec<OutboxRow>, DatabaseError> {
        self.query(
            "SELECT handle, nudge_type, effective_type, fire_at, armed_at
             FROM scheduled_notifications ORDER BY fire_at, handle",
            None,
        )
    }

    /// Remove and return every row due at or before `now`.
    pub fn take_due(&self, now: NaiveDateTime) -> Result<Vec<OutboxRow>, DatabaseError> {
        let cutoff = now.format(FIRE_AT_FORMAT).to_string();
        let due = self.query(
            "SELECT handle, nudge_type, effective_type, fire_at, armed_at
             FROM scheduled_notifications WHERE fire_at <= ?1 ORDER BY fire_at, handle",
            Some(&cutoff),
        )?;
        let conn = self.db.conn()?;
        for row in &due {
            conn.execute(
                "DELETE FROM scheduled_notifications WHERE handle = ?1",
                params![row.handle.as_str()],
            )?;
        }
        if !due.is_empty() {
            tracing::debug!(count = due.len(), %now, "outbox delivered");
        }
        Ok(due)
    }

    fn query(&self, sql: &str, cutoff: Option<&str>) -> Result<Vec<OutboxRow>, DatabaseError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        };
        let raw = match cutoff {
            Some(cutoff) => stmt
                .query_map(params![cutoff], map)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?,
        };
        raw.into_iter()
            .map(|(handle, nudge, effective, fire_at, armed_at)| {
                Ok(OutboxRow {
                    handle: NotificationHandle::new(handle),
                    nudge: parse_nudge(&nudge)?,
                    effective: parse_nudge(&effective)?,
                    fire_at: parse_time(&fire_at)?,
                    armed_at: parse_time(&armed_at)?,
                })
            })
            .collect()
    }

    fn check_permission(&self, nudge: NudgeType) -> Result<(), NotificationError> {
        if self.permission_granted {
            Ok(())
        } else {
            Err(NotificationError::PermissionDenied { nudge })
        }
    }
}

fn parse_nudge(raw: &str) -> Result<NudgeType, DatabaseError> {
    raw.parse()
        .map_err(|e: String| DatabaseError::QueryFailed(format!("scheduled_notifications: {e}")))
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, FIRE_AT_FORMAT)
        .map_err(|e| DatabaseError::QueryFailed(format!("scheduled_notifications: {raw:?}: {e}")))
}

impl NotificationPrimitive for LocalOutbox {
    fn arm_one_shot(
        &self,
        nudge: NudgeType,
        effective: NudgeType,
        fire_at: NaiveDateTime,
    ) -> Result<NotificationHandle, NotificationError> {
        self.check_permission(nudge)?;
        let handle = NotificationHandle::new(uuid::Uuid::new_v4().to_string());
        let armed_at = Local::now().naive_local();
        let inserted = self.db.conn().map_err(|e| e.to_string()).and_then(|conn| {
            conn.execute(
                "INSERT INTO scheduled_notifications
                    (handle, nudge_type, effective_type, fire_at, armed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    handle.as_str(),
                    nudge.as_str(),
                    effective.as_str(),
                    fire_at.format(FIRE_AT_FORMAT).to_string(),
                    armed_at.format(FIRE_AT_FORMAT).to_string(),
                ],
            )
            .map_err(|e| e.to_string())
        });
        inserted.map_err(|message| NotificationError::ArmFailed { nudge, message })?;
        Ok(handle)
    }

    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError> {
        let deleted = self.db.conn().map_err(|e| e.to_string()).and_then(|conn| {
            conn.execute(
                "DELETE FROM scheduled_notifications WHERE handle = ?1",
                params![handle.as_str()],
            )
            .map_err(|e| e.to_string())
        });
        match deleted {
            Ok(0) => Err(NotificationError::StaleHandle(handle.clone())),
            Ok(_) => Ok(()),
            Err(message) => Err(NotificationError::CancelFailed {
                handle: handle.clone(),
                message,
            }),
        }
    }

    fn present_now(&self, nudge: NudgeType, effective: NudgeType) -> Result<(), NotificationError> {
        self.check_permission(nudge)?;
        tracing::info!(nudge = %nudge, effective = %effective, "presenting notification now");
        Ok(())
    }
}
