//! Client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::DraftConfig;
use crate::db::{email_repo, Database};
use crate::error::ConfigError;
use crate::model::Email;

use super::error::DraftError;

/// Returned in place of a draft whenever generation fails.
pub const DRAFT_FAILURE: &str = "Error generating draft reply";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum length of an error body kept for the log.
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

/// Builds the prompt sent for `email`.
pub fn build_prompt(email: &Email) -> String {
    format!(
        "You are a helpful support assistant.\n\
         The customer sent the following message:\n\
         Subject: {}\n\
         Body: {}\n\n\
         Please draft a professional and friendly reply. \
         If the tone is frustrated, acknowledge their frustration empathetically. \
         Include relevant details if a product is mentioned. \
         Keep it concise but supportive.",
        email.subject.as_deref().unwrap_or_default(),
        email.body
    )
}

/// Asks the generation API for a reply draft.
pub struct DraftGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl DraftGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ConfigError::Validation {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Builds a generator from config, resolving the API key. A missing key
    /// leaves the generator disabled.
    pub fn from_config(config: &DraftConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .resolve_optional()
            .map_err(|source| ConfigError::Secret {
                field: "draft.apiKey",
                source,
            })?;

        if api_key.is_none() {
            info!("No draft API key configured, draft generation disabled");
        }

        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generates a draft for `email` and stores it as the email's draft
    /// reply. On any failure the stored draft is left untouched and
    /// [`DRAFT_FAILURE`] is returned.
    pub async fn generate(&self, db: &Database, email: &Email) -> String {
        let draft = match self.request_draft(email).await {
            Ok(draft) => draft,
            Err(e) => {
                error!("Draft generation for email {} failed: {}", email.id, e);
                return DRAFT_FAILURE.to_string();
            }
        };

        match email_repo::set_draft_reply(db, email.id, &draft) {
            Ok(true) => draft,
            Ok(false) => {
                error!("Email {} disappeared before its draft was stored", email.id);
                DRAFT_FAILURE.to_string()
            }
            Err(e) => {
                error!("Failed to store draft for email {}: {}", email.id, e);
                DRAFT_FAILURE.to_string()
            }
        }
    }

    /// Performs the API call without touching the store.
    pub async fn request_draft(&self, email: &Email) -> Result<String, DraftError> {
        let api_key = self.api_key.as_ref().ok_or(DraftError::Disabled)?;

        let url = format!("{}/v1/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": build_prompt(email) } ] }
            ]
        });

        debug!("Requesting draft for email {} from {}", email.id, url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.expose_secret())])
            .json(&body)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_LENGTH {
                let mut cut = MAX_ERROR_BODY_LENGTH;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
                body.push_str("... (truncated)");
            }
            return Err(DraftError::Status { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DraftError::MalformedResponse(e.without_url().to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                DraftError::MalformedResponse("missing candidates[0].content.parts[0].text".into())
            })
    }
}
