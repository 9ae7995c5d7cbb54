use thiserror::Error;

/// Why a list could not be fetched.
///
/// Any of these quarantines the rule for the current run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{provider} credentials are not configured")]
    MissingCredentials { provider: &'static str },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("{provider} response could not be decoded: {reason}")]
    Decode { provider: &'static str, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("fetch cancelled")]
    Cancelled,
}

impl SourceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}
