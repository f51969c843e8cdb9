//! Mail ingestion.
//!
//! Reads a support mailbox over IMAP (read-only), normalizes each message
//! and stores the ones not seen before.

pub mod client;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod source;

pub use client::{ImapClient, RawMessage};
pub use error::EmailError;
pub use ingest::{ingest, store_fetched, IngestReport};
pub use parser::{html_to_text, parse_message, FetchedMessage, MessageContent};
pub use source::{ImapMailSource, MailSource};
