//! Operations the dashboard performs on the support inbox.

use std::sync::Arc;

use chrono::Utc;
use log::info;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::{Config, IdentifierFallback};
use crate::db::kb_repo::{self, KbArticle, NewKbArticle};
use crate::db::stats_repo::{self, Analytics};
use crate::db::{email_repo, Database};
use crate::draft::DraftGenerator;
use crate::email::{ingest, ImapMailSource, IngestReport, MailSource};
use crate::error::{ConfigError, Result, SupportDeskError};
use crate::model::{Email, NewEmail};

/// Body of a direct email submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmailSubmission {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: String,
}

pub const DEMO_SENDER: &str = "customer@example.com";
pub const DEMO_SUBJECT: &str = "Request: cannot access dashboard - urgent";
pub const DEMO_BODY: &str =
    "Hi team, I cannot access the dashboard. Error 403. Phone +1 555-123-4567. Please help asap.";

/// Facade over the email store, the mail source and the draft generator.
///
/// Cloning is cheap. Ingestion cycles run one at a time across all clones.
#[derive(Clone)]
pub struct SupportDesk {
    db: Database,
    source: Option<Arc<dyn MailSource>>,
    fallback: IdentifierFallback,
    drafts: Arc<DraftGenerator>,
    ingest_lock: Arc<Mutex<()>>,
}

impl SupportDesk {
    pub fn new(db: Database, drafts: DraftGenerator) -> Self {
        Self {
            db,
            source: None,
            fallback: IdentifierFallback::default(),
            drafts: Arc::new(drafts),
            ingest_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Wires up the IMAP source (if configured) and the draft generator.
    pub fn from_config(db: Database, config: &Config) -> std::result::Result<Self, ConfigError> {
        let mut desk = Self::new(db, DraftGenerator::from_config(&config.draft)?);
        if let Some(mail) = &config.mail {
            desk = desk.with_mail_source(
                Arc::new(ImapMailSource::new(mail.clone())),
                mail.identifier_fallback,
            );
        }
        Ok(desk)
    }

    pub fn with_mail_source(
        mut self,
        source: Arc<dyn MailSource>,
        fallback: IdentifierFallback,
    ) -> Self {
        self.source = Some(source);
        self.fallback = fallback;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Runs one ingestion cycle. Waits for a cycle already in progress.
    pub async fn fetch_mail(&self) -> Result<IngestReport> {
        let source = self.source.as_ref().ok_or_else(|| ConfigError::Validation {
            message: "no mail source configured".to_string(),
        })?;

        let _guard = self.ingest_lock.lock().await;
        Ok(ingest(&self.db, source.as_ref(), self.fallback).await?)
    }

    /// Emails in the dashboard view: urgent first, newest first.
    pub fn list_filtered(&self) -> Result<Vec<Email>> {
        Ok(email_repo::list_filtered(&self.db)?)
    }

    pub fn list_all(&self) -> Result<Vec<Email>> {
        Ok(email_repo::list_all(&self.db)?)
    }

    pub fn get(&self, id: i64) -> Result<Email> {
        email_repo::find_by_id(&self.db, id)?.ok_or(SupportDeskError::NotFound(id))
    }

    /// Stores a directly submitted email, triaged like an ingested one.
    pub fn create_email(&self, submission: EmailSubmission) -> Result<Email> {
        let email = NewEmail::triaged(
            None,
            submission.sender,
            submission.subject,
            submission.body,
            Utc::now(),
        );
        let id = email_repo::insert_submitted(&self.db, &email)?;
        info!("Created email {} (priority {})", id, email.priority);
        self.get(id)
    }

    /// Records the final reply and marks the email approved.
    pub fn submit_reply(&self, id: i64, reply: &str) -> Result<()> {
        if email_repo::set_final_reply(&self.db, id, reply)? {
            info!("Reply submitted for email {}", id);
            Ok(())
        } else {
            Err(SupportDeskError::NotFound(id))
        }
    }

    pub fn update_status(&self, id: i64, status: &str) -> Result<()> {
        if email_repo::update_status(&self.db, id, status)? {
            info!("Email {} status set to '{}'", id, status);
            Ok(())
        } else {
            Err(SupportDeskError::NotFound(id))
        }
    }

    /// Drafts a reply for a stored email. Generation failures come back as
    /// the failure sentinel, not as an error.
    pub async fn generate_draft(&self, id: i64) -> Result<String> {
        let email = self.get(id)?;
        Ok(self.drafts.generate(&self.db, &email).await)
    }

    pub fn analytics(&self) -> Result<Analytics> {
        Ok(stats_repo::analytics(&self.db, Utc::now())?)
    }

    /// Inserts a sample urgent email when the store is empty. Returns
    /// whether anything was inserted.
    pub fn seed_demo(&self) -> Result<bool> {
        if email_repo::count(&self.db)? > 0 {
            return Ok(false);
        }
        self.create_email(EmailSubmission {
            sender: Some(DEMO_SENDER.to_string()),
            subject: Some(DEMO_SUBJECT.to_string()),
            body: DEMO_BODY.to_string(),
        })?;
        Ok(true)
    }

    pub fn list_articles(&self) -> Result<Vec<KbArticle>> {
        Ok(kb_repo::list(&self.db)?)
    }

    pub fn search_articles(&self, query: &str) -> Result<Vec<KbArticle>> {
        Ok(kb_repo::search(&self.db, query)?)
    }

    pub fn create_article(&self, article: &NewKbArticle) -> Result<KbArticle> {
        Ok(kb_repo::insert(&self.db, article)?)
    }
}
