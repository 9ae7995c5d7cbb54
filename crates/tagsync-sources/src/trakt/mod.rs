pub mod api;

use reqwest::Url;
use tagsync_config::ProviderConfig;

use crate::error::SourceError;
use crate::traits::ListRequest;

pub use api::decode_list;

const TRAKT_API_BASE: &str = "https://api.trakt.tv";
const TRAKT_API_VERSION: &str = "2";

/// Prefixes stripped from URLs that do not parse (missing scheme, etc.).
const KNOWN_PREFIXES: &[&str] = &[
    "https://api.trakt.tv",
    "https://app.trakt.tv",
    "https://www.trakt.tv",
    "https://trakt.tv",
    "http://api.trakt.tv",
    "http://trakt.tv",
    "api.trakt.tv",
    "app.trakt.tv",
    "www.trakt.tv",
    "trakt.tv",
];

/// Reduce a user-supplied Trakt URL or path to an API path.
///
/// User list URLs are pointed at their `/items` endpoint.
pub fn normalize_path(url: &str) -> String {
    let trimmed = url.trim();

    let mut path = match Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => {
            let lower = trimmed.to_lowercase();
            KNOWN_PREFIXES
                .iter()
                .find(|prefix| lower.starts_with(*prefix))
                .map(|prefix| trimmed[prefix.len()..].to_string())
                .unwrap_or_else(|| trimmed.to_string())
        }
    };

    if let Some(idx) = path.find('?') {
        path.truncate(idx);
    }
    let mut path = path.trim_end_matches('/').to_string();

    if path.contains("/users/") && path.contains("/lists/") && !path.ends_with("/items") {
        path.push_str("/items");
    }
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    path
}

/// Build the API request for a Trakt list.
pub fn build_request(url: &str, limit: usize, providers: &ProviderConfig) -> Result<ListRequest, SourceError> {
    if !providers.is_trakt_configured() {
        return Err(SourceError::MissingCredentials { provider: "trakt" });
    }

    let request_url = format!("{}{}?limit={}", TRAKT_API_BASE, normalize_path(url), limit);
    Ok(ListRequest::new(request_url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("trakt-api-version", TRAKT_API_VERSION)
        .header("trakt-api-key", providers.trakt_client_id.trim())
        .header("User-Agent", format!("tagsync/{}", env!("CARGO_PKG_VERSION"))))
}
