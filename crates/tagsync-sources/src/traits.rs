use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;

/// A fully built GET request for one provider API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl ListRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Transport used by the list adapters.
///
/// Implementations return the raw response body. They must give up with
/// [`SourceError::Cancelled`] soon after `cancel` fires.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, request: &ListRequest, cancel: &CancellationToken) -> Result<String, SourceError>;
}
