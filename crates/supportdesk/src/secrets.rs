//! Secret references for credentials kept outside the config file.
//!
//! A [`SecretRef`] names where a secret lives. Sources are tried in order:
//!
//! 1. **Inline value** - handy for local testing (`"value": "hunter2"`)
//! 2. **File** - Docker secrets style (`"file": "/run/secrets/imap"`)
//! 3. **Environment variable** - (`"env": "SUPPORTDESK_IMAP_PASSWORD"`)

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source configured (need an inline value, a file path, or an env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where to find a single secret value.
///
/// In the config file this is a small object, e.g.
/// `"password": { "env": "SUPPORTDESK_IMAP_PASSWORD" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl SecretRef {
    pub fn inline(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn from_env(name: impl Into<String>) -> Self {
        Self {
            env: Some(name.into()),
            ..Default::default()
        }
    }

    /// Returns true if at least one non-empty source is set.
    pub fn is_configured(&self) -> bool {
        non_empty(self.value.as_deref()).is_some()
            || non_empty(self.file.as_deref()).is_some()
            || non_empty(self.env.as_deref()).is_some()
    }

    /// Resolves the secret, failing if no source yields a value.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(value) = non_empty(self.value.as_deref()) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = non_empty(self.file.as_deref()) {
            let expanded = expand_home(path);
            return match fs::read_to_string(&expanded) {
                // Files written by editors usually end in a newline.
                Ok(content) => Ok(SecretString::from(content.trim().to_string())),
                Err(source) => Err(SecretError::FileReadError {
                    path: expanded,
                    source,
                }),
            };
        }

        if let Some(name) = non_empty(self.env.as_deref()) {
            return match std::env::var(name) {
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }

    /// Like [`SecretRef::resolve`], but an unconfigured reference yields `None`.
    pub fn resolve_optional(&self) -> Result<Option<SecretString>> {
        match self.resolve() {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretError::NoSourceProvided) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Expands a leading `~` to the user's home directory.
///
/// `~user/path` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            if path == "~" {
                return home.into_owned();
            }
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
