//! Retention sweep.
//!
//! Maintenance outside the ledger API: drops completion entries older than a
//! cutoff day. The ledger stays correct either way because a missing entry
//! already reads as not started.

use chrono::NaiveDate;

use crate::db::Database;
use crate::error::Result;
use crate::models::CompletionEntry;

/// Delete every entry dated strictly before `cutoff`; returns how many went.
pub fn purge_entries_before(db: &Database, cutoff: NaiveDate) -> Result<usize> {
    let purged = db.with_connection(|conn| CompletionEntry::purge_before(conn, cutoff))?;
    tracing::info!(cutoff = %cutoff, purged, "Purged old completion entries");
    Ok(purged)
}
