use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SourceError;
use crate::traits::{HttpFetch, ListRequest};

/// Characters of an error body kept in [`SourceError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// [`HttpFetch`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get_text(&self, request: &ListRequest, cancel: &CancellationToken) -> Result<String, SourceError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let send = async {
            let response = builder.send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let body: String = response
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect();
                return Err(SourceError::Status {
                    url: redact(&request.url),
                    status: status.as_u16(),
                    body,
                });
            }
            let text = response.text().await?;
            debug!("Fetched {} bytes from {}", text.len(), redact(&request.url));
            Ok::<String, SourceError>(text)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            result = send => result,
        }
    }
}

/// Strip the query string so API keys never reach logs or error messages.
pub fn redact(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?…", base),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_drops_query() {
        assert_eq!(redact("https://mdblist.com/lists/a/b/json?apikey=secret"), "https://mdblist.com/lists/a/b/json?…");
        assert_eq!(redact("https://api.trakt.tv/movies/trending"), "https://api.trakt.tv/movies/trending");
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let fetcher = ReqwestFetcher::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        // Unroutable address; the cancelled branch must win
        let request = ListRequest::new("http://10.255.255.1:9/never");
        let result = fetcher.get_text(&request, &cancel).await;
        assert!(matches!(result, Err(SourceError::Cancelled)));
    }
}
