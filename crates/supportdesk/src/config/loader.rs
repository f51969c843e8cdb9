use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::{Config, MailConfig};
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.bind.parse::<SocketAddr>().is_err() {
        return Err(invalid(format!(
            "server.bind '{}' is not a socket address (expected e.g. 127.0.0.1:8080)",
            config.server.bind
        )));
    }

    if let Some(mail) = &config.mail {
        validate_mail(mail)?;
    }

    let draft = &config.draft;
    if !(draft.base_url.starts_with("http://") || draft.base_url.starts_with("https://")) {
        return Err(invalid(format!(
            "draft.baseUrl '{}' must start with http:// or https://",
            draft.base_url
        )));
    }
    if draft.model.trim().is_empty() {
        return Err(invalid("draft.model must not be empty"));
    }
    if draft.timeout_secs == 0 {
        return Err(invalid("draft.timeoutSecs must be greater than zero"));
    }

    Ok(())
}

fn validate_mail(mail: &MailConfig) -> Result<(), ConfigError> {
    if mail.host.trim().is_empty() {
        return Err(invalid("mail.host must not be empty"));
    }
    if mail.port == 0 {
        return Err(invalid("mail.port must not be 0"));
    }
    if mail.username.trim().is_empty() {
        return Err(invalid("mail.username must not be empty"));
    }
    if !mail.password.is_configured() {
        return Err(invalid(
            "mail.password needs one of: value, file, env",
        ));
    }
    if mail.folder.trim().is_empty() {
        return Err(invalid("mail.folder must not be empty"));
    }
    if mail.timeout_secs == 0 {
        return Err(invalid("mail.timeoutSecs must be greater than zero"));
    }
    if mail.poll_interval_secs == Some(0) {
        return Err(invalid("mail.pollIntervalSecs must be greater than zero"));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
