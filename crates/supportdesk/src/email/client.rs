//! IMAP client for reading a support mailbox.

use std::fmt::Display;
use std::future::Future;
use std::net::TcpStream;
use std::time::Duration;

use async_imap::types::Fetch;
use async_imap::Session;
use async_native_tls::TlsConnector;
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use secrecy::ExposeSecret;

use crate::config::{MailConfig, MailProtocol};

use super::error::{EmailError, Result};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// One message as returned by the server, before parsing.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub uid: Option<u32>,
    /// Server-side arrival time (IMAP INTERNALDATE).
    pub internal_date: Option<DateTime<Utc>>,
    pub bytes: Vec<u8>,
}

/// IMAP client that only ever opens folders read-only.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    config: MailConfig,
    timeout: Duration,
}

impl ImapClient {
    pub fn new(config: MailConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            session: None,
            config,
            timeout,
        }
    }

    /// Connects to the IMAP server and logs in. Bounded by the configured
    /// timeout as a whole.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        if self.config.protocol != MailProtocol::Imaps {
            return Err(EmailError::ConfigError(
                "TLS is required for secure email connections".to_string(),
            ));
        }

        let password = self
            .config
            .password
            .resolve()
            .map_err(|e| EmailError::CredentialsNotFound(e.to_string()))?;

        let host = self.config.host.clone();
        let port = self.config.port;
        let username = self.config.username.clone();

        info!("Connecting to IMAP server at {}:{}", host, port);

        let session = with_timeout(self.timeout, "connect", async move {
            let addr = tokio::net::lookup_host((host.as_str(), port))
                .await
                .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?
                .next()
                .ok_or_else(|| {
                    EmailError::ConnectionFailed(format!("could not resolve {}", host))
                })?;

            let tcp_stream = AsyncTcpStream::connect(addr)
                .await
                .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

            let tls_stream = TlsConnector::new().connect(&host, tcp_stream).await?;

            let client = async_imap::Client::new(tls_stream);
            client
                .login(&username, password.expose_secret())
                .await
                .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))
        })
        .await?;

        info!("Successfully authenticated to IMAP server");
        self.session = Some(session);
        Ok(())
    }

    /// Opens the configured folder with EXAMINE so nothing is marked as
    /// read. Returns the number of messages it holds.
    pub async fn examine_folder(&mut self) -> Result<u32> {
        let folder = self.config.folder.clone();
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| EmailError::ConnectionFailed("Not connected".to_string()))?;

        info!("Examining folder: {}", folder);

        let mailbox = with_timeout(self.timeout, "examine", async {
            session
                .examine(&folder)
                .await
                .map_err(|e| examine_error(&folder, e))
        })
        .await?;

        debug!("Folder '{}' holds {} messages", folder, mailbox.exists);
        Ok(mailbox.exists)
    }

    /// Fetches every message in the examined folder with BODY.PEEK[].
    pub async fn fetch_all(&mut self) -> Result<Vec<RawMessage>> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| EmailError::ConnectionFailed("Not connected".to_string()))?;

        let results = with_timeout(self.timeout, "fetch", async {
            let messages = session
                .uid_fetch("1:*", "(UID INTERNALDATE BODY.PEEK[])")
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

            collect_messages(messages, raw_from_fetch).await
        })
        .await?;

        debug!("Fetched {} messages", results.len());
        Ok(results)
    }

    /// Disconnects from the IMAP server gracefully.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            with_timeout(self.timeout, "logout", async {
                session
                    .logout()
                    .await
                    .map_err(|e| EmailError::ProtocolError(e.to_string()))
            })
            .await?;
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit disconnect - session will be closed");
        }
    }
}

/// A NO answer to EXAMINE means the folder is missing or not selectable.
fn examine_error(folder: &str, err: async_imap::error::Error) -> EmailError {
    match err {
        async_imap::error::Error::No(_) => EmailError::FolderNotFound(folder.to_string()),
        other => EmailError::ProtocolError(other.to_string()),
    }
}

fn raw_from_fetch(message: Fetch) -> Option<RawMessage> {
    match message.body() {
        Some(body) => Some(RawMessage {
            uid: message.uid,
            internal_date: message.internal_date().map(|d| d.with_timezone(&Utc)),
            bytes: body.to_vec(),
        }),
        None => {
            warn!("Message UID={:?} has no body, skipping", message.uid);
            None
        }
    }
}

/// Drains a fetch response. An error anywhere in the stream fails the whole
/// fetch, so a cut-off mailbox is never reported as complete.
async fn collect_messages<S, T, E>(
    mut stream: S,
    to_raw: impl Fn(T) -> Option<RawMessage>,
) -> Result<Vec<RawMessage>>
where
    S: Stream<Item = std::result::Result<T, E>> + Unpin,
    E: Display,
{
    let mut results = Vec::new();
    while let Some(item) = stream.next().await {
        let message = item.map_err(|e| {
            EmailError::ProtocolError(format!(
                "fetch aborted after {} messages: {}",
                results.len(),
                e
            ))
        })?;
        if let Some(raw) = to_raw(message) {
            results.push(raw);
        }
    }
    Ok(results)
}

async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        EmailError::Timeout(format!("{} exceeded {}s", operation, limit.as_secs()))
    })?
}
