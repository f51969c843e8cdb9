//! Dashboard counters over the `emails` table.

use chrono::{DateTime, Duration, Utc};
use rusqlite::params;
use serde::Serialize;

use crate::model::{STATUS_PENDING, STATUS_RESOLVED};

use super::email_repo::format_timestamp;
use super::{Database, DatabaseError};

/// Snapshot shown on the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Analytics {
    /// Emails received within the 24 hours before the snapshot.
    #[serde(rename = "total24h")]
    pub total_24h: u64,
    pub resolved: u64,
    pub pending: u64,
}

/// Counts emails whose original receipt time is at or after `since`.
pub fn count_received_since(db: &Database, since: &DateTime<Utc>) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM emails WHERE received_at >= ?1",
            params![format_timestamp(since)],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Counts emails with exactly this status label.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM emails WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Builds the analytics snapshot relative to `now`.
pub fn analytics(db: &Database, now: DateTime<Utc>) -> Result<Analytics, DatabaseError> {
    Ok(Analytics {
        total_24h: count_received_since(db, &(now - Duration::hours(24)))?,
        resolved: count_by_status(db, STATUS_RESOLVED)?,
        pending: count_by_status(db, STATUS_PENDING)?,
    })
}
