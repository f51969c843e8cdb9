use thiserror::Error;

/// Why a draft could not be produced. Callers only ever see the failure
/// sentinel; these end up in the logs.
#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Draft generation is disabled (no API key configured)")]
    Disabled,

    /// The request URL carries the API key, so it is stripped before the
    /// error is kept.
    #[error("Generation request failed: {0}")]
    Http(reqwest::Error),

    #[error("Generation API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected generation response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for DraftError {
    fn from(e: reqwest::Error) -> Self {
        DraftError::Http(e.without_url())
    }
}
