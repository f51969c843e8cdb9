pub mod config;
pub mod db;
pub mod desk;
pub mod draft;
pub mod email;
pub mod error;
pub mod model;
pub mod secrets;

pub use config::{load_config, Config};
pub use db::Database;
pub use desk::{EmailSubmission, SupportDesk};
pub use draft::{DraftGenerator, DRAFT_FAILURE};
pub use email::{ImapMailSource, IngestReport, MailSource};
pub use error::{ConfigError, Result, SupportDeskError};
pub use model::{Email, NewEmail, Priority};
pub use secrets::{SecretError, SecretRef};
