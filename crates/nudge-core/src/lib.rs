//! # Nudge Core Library
//!
//! This library decides when the app may remind the user, schedules those
//! reminders as one-shot local notifications, and keeps a per-type ledger
//! of what fired and what was opened. The CLI binary is a thin layer over
//! the same core library.
//!
//! ## Architecture
//!
//! - **Eligibility**: pure functions over a facts snapshot and ledger history
//! - **Scheduler**: cancel/arm against a [`NotificationPrimitive`], at most one
//!   live handle per slot
//! - **Reconciler**: routes events into per-slot passes and counts ignored
//!   fires towards backoff
//! - **Storage**: SQLite-backed ledger and outbox, TOML configuration
//!
//! ## Key Components
//!
//! - [`Reconciler`]: entry point for every trigger
//! - [`Scheduler`]: one slot's decide/apply pass
//! - [`LedgerStore`]: persisted per-type history
//! - [`Config`]: reminder settings

pub mod backoff;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod facts;
pub mod ledger;
pub mod nudge;
pub mod reconciler;
pub mod routing;
pub mod scheduler;
pub mod storage;

pub use backoff::BackoffPolicy;
pub use eligibility::{evaluate, morning_slot, Eligibility, SlotHistory, Suppression};
pub use error::{ConfigError, DatabaseError, LedgerError, NotificationError, ReconcileError};
pub use events::Event;
pub use facts::{FactsProvider, GlobalFacts, NudgeSettings, StaticFacts};
pub use ledger::{GlobalKey, LedgerEntry, LedgerStore, MemoryLedger, SqliteLedger};
pub use nudge::{MorningNudge, MorningSlot, NudgeState, NudgeType, Slot};
pub use reconciler::{NudgeEvent, ReconcileReport, Reconciler, SlotFailure};
pub use routing::{open_route, AppView, DeepLinkRouter, OpenRoute};
pub use scheduler::{
    NotificationHandle, NotificationPrimitive, RecordingPrimitive, ScheduleAction,
    ScheduleDecision, Scheduler,
};
pub use storage::{Config, Database, FactsFile, LocalFactsProvider, LocalOutbox};
