pub mod api;

use tagsync_config::ProviderConfig;

use crate::error::SourceError;
use crate::traits::ListRequest;

pub use api::decode_list;

/// Build the JSON export request for an MDBList list page URL.
pub fn build_request(url: &str, providers: &ProviderConfig) -> Result<ListRequest, SourceError> {
    if !providers.is_mdblist_configured() {
        return Err(SourceError::MissingCredentials { provider: "mdblist" });
    }

    let mut clean = url.trim().trim_end_matches('/').to_string();
    if let Some(idx) = clean.find('?') {
        clean.truncate(idx);
        clean = clean.trim_end_matches('/').to_string();
    }
    if !clean.contains("://") {
        clean.insert_str(0, "https://");
    }
    if !clean.ends_with("/json") {
        clean.push_str("/json");
    }

    let request_url = format!(
        "{}?apikey={}",
        clean,
        urlencoding::encode(providers.mdblist_api_key.trim())
    );
    Ok(ListRequest::new(request_url).header("Accept", "application/json"))
}
