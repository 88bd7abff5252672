//! Core library for missionlog.
//!
//! This crate provides the domain models, SQLite storage and the completion
//! engine for missionlog, independent of any transport layer (HTTP, CLI).
//!
//! - [`tree`]: task definitions, sub-items, cancellation and ordering
//! - [`ledger`]: per-day completion state, upserts and parent cascade
//! - [`stats`]: range totals and day classification
//! - [`streak`]: current/best streaks over classified days
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use missionlog_core::{CompletionLedger, Database, SystemClock};
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let ledger = CompletionLedger::new(db, Arc::new(SystemClock::utc()));
//! let _missions = ledger.list_for_day("user-1", Some("2025-03-10"))?;
//! # Ok::<(), missionlog_core::Error>(())
//! ```

pub mod clock;
pub mod day;
pub mod db;
pub mod error;
pub mod focus;
pub mod ledger;
pub mod models;
pub mod stats;
pub mod streak;
pub mod sweep;
pub mod tree;

// Re-export commonly used types at crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::Database;
pub use error::{Error, ErrorKind, Result};
pub use focus::FocusList;
pub use ledger::CompletionLedger;
pub use models::*;
pub use stats::{RangeAggregator, StatsConfig};
pub use tree::TaskTree;
