//! Where ingestion gets its messages from.

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};

use crate::config::MailConfig;

use super::client::ImapClient;
use super::error::Result;
use super::parser::{parse_message, FetchedMessage};

/// A mailbox that can be read in full. One call is one session.
#[async_trait]
pub trait MailSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<FetchedMessage>>;
}

/// Reads the configured IMAP folder read-only.
pub struct ImapMailSource {
    config: MailConfig,
}

impl ImapMailSource {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    async fn fetch_with(&self, client: &mut ImapClient) -> Result<Vec<FetchedMessage>> {
        client.connect().await?;

        let exists = client.examine_folder().await?;
        if exists == 0 {
            info!("Folder '{}' is empty", self.config.folder);
            return Ok(Vec::new());
        }

        let raw = client.fetch_all().await?;
        let fetched_at = Utc::now();
        Ok(raw
            .into_iter()
            .map(|m| parse_message(&m.bytes, m.internal_date, fetched_at))
            .collect())
    }
}

#[async_trait]
impl MailSource for ImapMailSource {
    async fn fetch_all(&self) -> Result<Vec<FetchedMessage>> {
        let mut client = ImapClient::new(self.config.clone());
        let result = self.fetch_with(&mut client).await;

        // Log out on every path. The fetched messages are kept even if the
        // logout fails.
        if let Err(e) = client.disconnect().await {
            warn!("IMAP logout failed: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IdentifierFallback, MailProtocol};
    use crate::email::EmailError;
    use crate::secrets::SecretRef;

    #[tokio::test]
    async fn test_plain_imap_rejected_before_network() {
        let source = ImapMailSource::new(MailConfig {
            host: "imap.invalid".to_string(),
            port: 143,
            protocol: MailProtocol::Imap,
            username: "u".to_string(),
            password: SecretRef::inline("p"),
            folder: "INBOX".to_string(),
            timeout_secs: 1,
            poll_interval_secs: None,
            identifier_fallback: IdentifierFallback::Derived,
        });
        let err = source.fetch_all().await.unwrap_err();
        assert!(matches!(err, EmailError::ConfigError(_)));
    }
}
