use serde::Deserialize;
use tagsync_models::ExternalItem;
use tracing::{debug, warn};

use crate::error::SourceError;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TraktIds {
    #[serde(default)]
    pub trakt: Option<u64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub tmdb: Option<u64>,
}

/// Movie and show payloads share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct TraktMedia {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: Option<TraktIds>,
}

/// Entry of `/users/{user}/lists/{id}/items`, `/movies/popular`-style
/// wrappers and similar endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TraktListEntry {
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub movie: Option<TraktMedia>,
    #[serde(default)]
    pub show: Option<TraktMedia>,
}

/// Remove slashes from IMDB ID (Trakt sometimes includes them)
fn remove_slashes(s: &str) -> String {
    s.replace('/', "")
}

fn to_external(media: &TraktMedia) -> Option<ExternalItem> {
    let title = media.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let ids = media.ids.clone().unwrap_or_default();
    Some(ExternalItem::new(
        title,
        ids.imdb.as_deref().map(remove_slashes),
        ids.tmdb.map(|id| id.to_string()),
    ))
}

/// Decode a Trakt list response.
///
/// Wrapped entries (`{"movie": {...}}` / `{"show": {...}}`) are tried first.
/// When no entry carries a movie or show payload the body is decoded as a
/// flat list of movie objects instead. A body matching neither shape is a
/// [`SourceError::Decode`].
pub fn decode_list(body: &str) -> Result<Vec<ExternalItem>, SourceError> {
    match serde_json::from_str::<Vec<TraktListEntry>>(body) {
        Ok(entries) if entries.iter().any(|e| e.movie.is_some() || e.show.is_some()) => {
            let items: Vec<ExternalItem> = entries
                .iter()
                .filter_map(|entry| entry.movie.as_ref().or(entry.show.as_ref()))
                .filter_map(to_external)
                .collect();
            debug!("Decoded {} wrapped Trakt entries", items.len());
            return Ok(items);
        }
        Ok(_) => {}
        Err(e) => debug!("Trakt body is not a list of wrapped entries: {}", e),
    }

    match serde_json::from_str::<Vec<TraktMedia>>(body) {
        Ok(flat) => {
            let items: Vec<ExternalItem> = flat.iter().filter_map(to_external).collect();
            debug!("Decoded {} flat Trakt entries", items.len());
            Ok(items)
        }
        Err(e) => {
            warn!("Could not decode Trakt response in any known shape: {}", e);
            Err(SourceError::Decode {
                provider: "Trakt",
                reason: e.to_string(),
            })
        }
    }
}
