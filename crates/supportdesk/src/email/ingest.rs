//! Ingestion gate: fetch a mailbox, drop what is already stored, triage and
//! persist the rest.

use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::IdentifierFallback;
use crate::db::{email_repo, Database};
use crate::model::NewEmail;

use super::error::Result;
use super::parser::FetchedMessage;
use super::source::MailSource;

/// Prefix marking identifiers the gate made up for messages without a
/// `Message-ID`.
pub const GENERATED_ID_PREFIX: &str = "generated-";

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub fetched: usize,
    pub stored: usize,
    pub skipped: usize,
}

/// Runs one full cycle against `source`. A source failure aborts the cycle;
/// messages stored before a store failure stay stored.
pub async fn ingest(
    db: &Database,
    source: &dyn MailSource,
    fallback: IdentifierFallback,
) -> Result<IngestReport> {
    let span = info_span!("ingest_cycle");
    async move {
        info!("Fetching mailbox");
        let messages = source.fetch_all().await?;
        let report = store_fetched(db, messages, fallback)?;
        info!(
            fetched = report.fetched,
            stored = report.stored,
            skipped = report.skipped,
            "Ingestion cycle finished"
        );
        Ok(report)
    }
    .instrument(span)
    .await
}

/// Persists every message not stored yet.
pub fn store_fetched(
    db: &Database,
    messages: Vec<FetchedMessage>,
    fallback: IdentifierFallback,
) -> Result<IngestReport> {
    let mut report = IngestReport {
        fetched: messages.len(),
        ..Default::default()
    };

    for message in messages {
        let key = match &message.identifier {
            Some(id) => id.clone(),
            None => fallback_identifier(&message, fallback),
        };

        if email_repo::exists_by_message_id(db, &key)? {
            debug!(message_id = %key, "Already stored, skipping");
            report.skipped += 1;
            continue;
        }

        let email = NewEmail::triaged(
            Some(key.clone()),
            message.sender,
            message.subject,
            message.body,
            message.received_at,
        );

        match email_repo::insert(db, &email)? {
            Some(id) => {
                debug!(id, message_id = %key, priority = %email.priority, "Stored email");
                report.stored += 1;
            }
            // Lost a race with a concurrent insert of the same identifier.
            None => report.skipped += 1,
        }
    }

    Ok(report)
}

/// Identifier for a message that arrived without one.
pub fn fallback_identifier(message: &FetchedMessage, fallback: IdentifierFallback) -> String {
    let uuid = match fallback {
        IdentifierFallback::Derived => {
            let seed = format!(
                "{}\n{}\n{}",
                message.sender.as_deref().unwrap_or_default(),
                message.subject.as_deref().unwrap_or_default(),
                message.received_at.to_rfc3339()
            );
            Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
        }
        IdentifierFallback::Random => Uuid::new_v4(),
    };
    format!("{}{}", GENERATED_ID_PREFIX, uuid)
}
