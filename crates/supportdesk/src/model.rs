//! Support email record and the triage rules applied when one is created.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment placeholder until a classifier exists.
pub const DEFAULT_SENTIMENT: &str = "Neutral";

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_RESOLVED: &str = "Resolved";

/// Triage priority, derived from the subject line only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Urgent")]
    Urgent,
    #[serde(rename = "Not urgent")]
    NotUrgent,
}

impl Priority {
    /// `Urgent` iff the subject contains "urgent", ignoring case.
    pub fn from_subject(subject: Option<&str>) -> Self {
        match subject {
            Some(s) if s.to_lowercase().contains("urgent") => Priority::Urgent,
            _ => Priority::NotUrgent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::NotUrgent => "Not urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Urgent" => Ok(Priority::Urgent),
            "Not urgent" => Ok(Priority::NotUrgent),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// A stored support email.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: i64,
    pub message_id: Option<String>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub received_at: DateTime<Utc>,
    pub sentiment: String,
    pub priority: Priority,
    pub phone: Option<String>,
    pub alt_email: Option<String>,
    pub requirements: Option<String>,
    pub draft_reply: Option<String>,
    pub final_reply: Option<String>,
    pub approved: bool,
    pub status: String,
    pub filtered: bool,
}

/// An email about to be inserted. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmail {
    pub message_id: Option<String>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub received_at: DateTime<Utc>,
    pub sentiment: String,
    pub priority: Priority,
    pub approved: bool,
    pub status: String,
    pub filtered: bool,
}

impl NewEmail {
    /// Builds a fresh record with the triage defaults every new email gets:
    /// priority from the subject, neutral sentiment, pending, unapproved, and
    /// visible in the filtered view.
    pub fn triaged(
        message_id: Option<String>,
        sender: Option<String>,
        subject: Option<String>,
        body: String,
        received_at: DateTime<Utc>,
    ) -> Self {
        let priority = Priority::from_subject(subject.as_deref());
        Self {
            message_id,
            sender,
            subject,
            body,
            received_at,
            sentiment: DEFAULT_SENTIMENT.to_string(),
            priority,
            approved: false,
            status: STATUS_PENDING.to_string(),
            filtered: true,
        }
    }
}
