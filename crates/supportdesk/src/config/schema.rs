use serde::{Deserialize, Serialize};

use crate::secrets::SecretRef;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Mailbox to ingest from. Without it only direct submission works.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailConfig>,
    #[serde(default)]
    pub draft: DraftConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Origin allowed by CORS (the dashboard front-end).
    #[serde(default = "default_cors_origin")]
    pub cors_origin: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_cors_origin() -> Option<String> {
    Some("http://localhost:5173".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `~/.supportdesk/data/supportdesk.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Wire protocol for the mail source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProtocol {
    /// IMAP over implicit TLS.
    #[default]
    Imaps,
    /// Plain IMAP. Rejected at connect time.
    Imap,
}

/// How the ingestion gate keys a message that carries no `Message-ID`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierFallback {
    /// Stable key hashed from sender, subject and receipt time.
    #[default]
    Derived,
    /// Fresh random key per fetch. Such messages are re-ingested every cycle.
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailConfig {
    pub host: String,

    #[serde(default = "default_imap_port")]
    pub port: u16,

    #[serde(default)]
    pub protocol: MailProtocol,

    pub username: String,

    #[serde(default)]
    pub password: SecretRef,

    #[serde(default = "default_inbox")]
    pub folder: String,

    /// Upper bound for connecting, logging in and each fetch round.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// When set, the server runs an ingestion cycle on this interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,

    #[serde(default)]
    pub identifier_fallback: IdentifierFallback,
}

fn default_imap_port() -> u16 {
    993
}

fn default_inbox() -> String {
    "INBOX".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftConfig {
    #[serde(default = "default_draft_base_url")]
    pub base_url: String,

    #[serde(default = "default_draft_model")]
    pub model: String,

    /// Without a key the draft adapter stays disabled.
    #[serde(default)]
    pub api_key: SecretRef,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_draft_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_draft_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            base_url: default_draft_base_url(),
            model: default_draft_model(),
            api_key: SecretRef::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
