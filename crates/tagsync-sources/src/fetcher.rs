use std::collections::HashSet;
use std::sync::Arc;

use tagsync_config::ProviderConfig;
use tagsync_models::ExternalItem;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::http::redact;
use crate::provider::Provider;
use crate::traits::HttpFetch;
use crate::{mdblist, trakt};

/// Routes a list URL to the right provider adapter and normalizes the
/// response into [`ExternalItem`]s.
#[derive(Clone)]
pub struct ListFetcher {
    http: Arc<dyn HttpFetch>,
}

impl ListFetcher {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }

    /// Fetch at most `limit` items from `url`, in provider rank order.
    ///
    /// A blank URL yields an empty list. Transport failures, non-success
    /// statuses, undecodable bodies and missing credentials are returned as
    /// errors so the caller can quarantine the rule.
    pub async fn fetch(
        &self,
        url: &str,
        limit: usize,
        providers: &ProviderConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExternalItem>, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }

        let provider = match Provider::identify(url) {
            Some(provider) => provider,
            None => {
                warn!("Rule has no source URL, treating as empty list");
                return Ok(Vec::new());
            }
        };

        let request = match provider {
            Provider::Mdblist => mdblist::build_request(url, providers)?,
            Provider::Trakt => trakt::build_request(url, limit, providers)?,
        };
        debug!(operation = "fetch_list", provider = %provider, url = %redact(&request.url), "Requesting list");

        let body = self.http.get_text(&request, cancel).await?;
        let mut items = match provider {
            Provider::Mdblist => mdblist::decode_list(&body)?,
            Provider::Trakt => trakt::decode_list(&body)?,
        };
        items.truncate(limit);

        info!(
            operation = "fetch_list",
            provider = %provider,
            count = items.len(),
            "Fetched {} items from {}",
            items.len(),
            provider
        );
        Ok(items)
    }
}

/// Drop later entries whose identity key repeats an earlier one, ignoring
/// case. Items without any id are kept as-is.
pub fn dedup_by_identity(items: Vec<ExternalItem>) -> Vec<ExternalItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match item.identity_key() {
            Some(key) => seen.insert(key.to_lowercase()),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ListRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a canned body and records the requests it saw.
    struct FakeHttp {
        body: Result<String, u16>,
        requests: Mutex<Vec<ListRequest>>,
    }

    impl FakeHttp {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: Ok(body.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                body: Err(status),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<ListRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpFetch for FakeHttp {
        async fn get_text(&self, request: &ListRequest, _cancel: &CancellationToken) -> Result<String, SourceError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.body {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(SourceError::Status {
                    url: request.url.clone(),
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn providers() -> ProviderConfig {
        ProviderConfig {
            trakt_client_id: "client".to_string(),
            mdblist_api_key: "key".to_string(),
        }
    }

    #[tokio::test]
    async fn test_trakt_flat_fallback_and_limit() {
        let http = FakeHttp::ok(
            r#"[
                {"title":"Heat","ids":{"imdb":"tt0113277","tmdb":949}},
                {"title":"Ronin","ids":{"imdb":"tt0122690"}},
                {"title":"Collateral","ids":{"imdb":"tt0369339"}}
            ]"#,
        );
        let fetcher = ListFetcher::new(http.clone());
        let items = fetcher
            .fetch("https://trakt.tv/users/someone/lists/crime", 2, &providers(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Heat");
        assert_eq!(items[1].name, "Ronin");

        let seen = http.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://api.trakt.tv/users/someone/lists/crime/items?limit=2");
    }

    #[tokio::test]
    async fn test_mdblist_routing() {
        let http = FakeHttp::ok(r#"[{"title":"Heat","imdb_id":"tt0113277","id":949}]"#);
        let fetcher = ListFetcher::new(http.clone());
        let items = fetcher
            .fetch("https://mdblist.com/lists/someone/heist", 10, &providers(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(http.seen()[0].url, "https://mdblist.com/lists/someone/heist/json?apikey=key");
    }

    #[tokio::test]
    async fn test_blank_url_is_empty_without_request() {
        let http = FakeHttp::ok("[]");
        let fetcher = ListFetcher::new(http.clone());
        let items = fetcher.fetch("  ", 10, &providers(), &CancellationToken::new()).await.unwrap();
        assert!(items.is_empty());
        assert!(http.seen().is_empty());
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let fetcher = ListFetcher::new(FakeHttp::ok("<html>502 Bad Gateway</html>"));
        let result = fetcher
            .fetch("/movies/trending", 10, &providers(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(SourceError::Decode { provider: "Trakt", .. })));
    }

    #[tokio::test]
    async fn test_valid_empty_list_is_ok() {
        let fetcher = ListFetcher::new(FakeHttp::ok("[]"));
        let items = fetcher
            .fetch("https://mdblist.com/lists/someone/empty", 10, &providers(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_http_status_is_error() {
        let fetcher = ListFetcher::new(FakeHttp::status(503));
        let result = fetcher
            .fetch("/movies/trending", 10, &providers(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(SourceError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let http = FakeHttp::ok("[]");
        let fetcher = ListFetcher::new(http.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = fetcher.fetch("/movies/trending", 10, &providers(), &cancel).await;
        assert!(matches!(result, Err(SourceError::Cancelled)));
        assert!(http.seen().is_empty());
    }

    #[test]
    fn test_dedup_by_identity() {
        let items = vec![
            ExternalItem::new("A", Some("tt1".into()), None),
            ExternalItem::new("A again", Some("TT1".into()), Some("5".into())),
            ExternalItem::new("B", None, Some("7".into())),
            ExternalItem::new("B again", None, Some("7".into())),
            ExternalItem::new("Anonymous", None, None),
            ExternalItem::new("Anonymous", None, None),
        ];
        let deduped = dedup_by_identity(items);
        let names: Vec<&str> = deduped.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "Anonymous", "Anonymous"]);
    }
}
