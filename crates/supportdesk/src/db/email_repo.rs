//! Email repository: CRUD operations for the `emails` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::model::{Email, NewEmail, Priority};

use super::{Database, DatabaseError};

const SELECT_COLUMNS: &str = "id, message_id, sender, subject, body, received_at, sentiment,
     priority, phone, alt_email, requirements, draft_reply, final_reply, approved, status,
     filtered";
// Positions within SELECT_COLUMNS, for conversion errors.
const RECEIVED_AT_IDX: usize = 5;
const PRIORITY_IDX: usize = 7;

/// Formats a timestamp the way it is stored.
///
/// Fixed precision and a `Z` suffix keep text ordering identical to time
/// ordering, which the list queries rely on.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn email_from_row(row: &Row<'_>) -> Result<Email, rusqlite::Error> {
    let received_at: String = row.get("received_at")?;
    let priority: String = row.get("priority")?;

    Ok(Email {
        id: row.get("id")?,
        message_id: row.get("message_id")?,
        sender: row.get("sender")?,
        subject: row.get("subject")?,
        body: row.get("body")?,
        received_at: parse_timestamp(RECEIVED_AT_IDX, &received_at)?,
        sentiment: row.get("sentiment")?,
        priority: priority.parse::<Priority>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(PRIORITY_IDX, Type::Text, e.into())
        })?,
        phone: row.get("phone")?,
        alt_email: row.get("alt_email")?,
        requirements: row.get("requirements")?,
        draft_reply: row.get("draft_reply")?,
        final_reply: row.get("final_reply")?,
        approved: row.get("approved")?,
        status: row.get("status")?,
        filtered: row.get("filtered")?,
    })
}

/// Runs the insert and reads the new rowid under one lock. `None` when no
/// row was written.
fn insert_with(db: &Database, verb: &str, email: &NewEmail) -> Result<Option<i64>, DatabaseError> {
    let sql = format!(
        "{} INTO emails (message_id, sender, subject, body, received_at,
         sentiment, priority, approved, status, filtered)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        verb
    );
    db.with_conn(|conn| {
        let inserted = conn.execute(
            &sql,
            params![
                email.message_id,
                email.sender,
                email.subject,
                email.body,
                format_timestamp(&email.received_at),
                email.sentiment,
                email.priority.as_str(),
                email.approved,
                email.status,
                email.filtered,
            ],
        )?;
        Ok((inserted > 0).then(|| conn.last_insert_rowid()))
    })
}

/// Inserts a fetched email.
///
/// Returns the assigned id, or `None` when another row already holds the
/// same `message_id` (the unique index turns the insert into a no-op).
pub fn insert(db: &Database, email: &NewEmail) -> Result<Option<i64>, DatabaseError> {
    insert_with(db, "INSERT OR IGNORE", email)
}

/// Inserts a directly submitted email and returns its id. A clashing
/// `message_id` is a constraint error here, not a silent skip.
pub fn insert_submitted(db: &Database, email: &NewEmail) -> Result<i64, DatabaseError> {
    // A plain INSERT either writes the row or fails.
    insert_with(db, "INSERT", email).map(|id| id.unwrap_or_default())
}

/// Returns true if an email with this `Message-ID` is already stored.
pub fn exists_by_message_id(db: &Database, message_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM emails WHERE message_id = ?1)",
            params![message_id],
            |r| r.get(0),
        )?;
        Ok(exists)
    })
}

/// Finds an email by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Email>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("SELECT {} FROM emails WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![id], email_from_row)
            .optional()?)
    })
}

/// Finds an email by its `Message-ID`.
pub fn find_by_message_id(
    db: &Database,
    message_id: &str,
) -> Result<Option<Email>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("SELECT {} FROM emails WHERE message_id = ?1", SELECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![message_id], email_from_row)
            .optional()?)
    })
}

fn query_list(db: &Database, sql: &str) -> Result<Vec<Email>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], email_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Emails in the filtered view: urgent first, newest first within a priority.
pub fn list_filtered(db: &Database) -> Result<Vec<Email>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM emails WHERE filtered = 1
         ORDER BY CASE priority WHEN 'Urgent' THEN 0 ELSE 1 END, received_at DESC, id DESC",
        SELECT_COLUMNS
    );
    query_list(db, &sql)
}

/// Every stored email, newest first.
pub fn list_all(db: &Database) -> Result<Vec<Email>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM emails ORDER BY received_at DESC, id DESC",
        SELECT_COLUMNS
    );
    query_list(db, &sql)
}

/// Sets the lifecycle status. Returns false if the id is unknown.
pub fn update_status(db: &Database, id: i64, status: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE emails SET status = ?2 WHERE id = ?1",
            params![id, status],
        )?;
        Ok(updated > 0)
    })
}

/// Stores the reviewer's final reply and marks the email approved.
/// Returns false if the id is unknown.
pub fn set_final_reply(db: &Database, id: i64, reply: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE emails SET final_reply = ?2, approved = 1 WHERE id = ?1",
            params![id, reply],
        )?;
        Ok(updated > 0)
    })
}

/// Stores a generated draft reply. Returns false if the id is unknown.
pub fn set_draft_reply(db: &Database, id: i64, draft: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE emails SET draft_reply = ?2 WHERE id = ?1",
            params![id, draft],
        )?;
        Ok(updated > 0)
    })
}

/// Counts all stored emails.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM emails", [], |r| r.get(0))?;
        Ok(count)
    })
}
