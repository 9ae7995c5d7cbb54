use serde::Deserialize;
use serde_json::Value;
use tagsync_models::ExternalItem;
use tracing::{debug, warn};

use crate::error::SourceError;

/// One entry of an MDBList JSON export. `id` is the TMDB id and arrives as
/// either a number or a string depending on the list.
#[derive(Debug, Clone, Deserialize)]
pub struct MdblistItem {
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub mediatype: Option<String>,
}

/// Some exports split the list by media type. At least one half must be
/// present.
#[derive(Debug, Clone, Deserialize)]
struct SplitExport {
    #[serde(default)]
    movies: Option<Vec<MdblistItem>>,
    #[serde(default)]
    shows: Option<Vec<MdblistItem>>,
}

fn tmdb_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn to_external(item: &MdblistItem) -> Option<ExternalItem> {
    let title = item.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    Some(ExternalItem::new(
        title,
        item.imdb_id.clone(),
        item.id.as_ref().and_then(tmdb_from_value),
    ))
}

fn undecodable(reason: String) -> SourceError {
    warn!("Could not decode MDBList response: {}", reason);
    SourceError::Decode {
        provider: "MDBList",
        reason,
    }
}

/// Decode an MDBList export body, either a flat list or split by media
/// type. Any other shape is a [`SourceError::Decode`].
pub fn decode_list(body: &str) -> Result<Vec<ExternalItem>, SourceError> {
    let entries = match serde_json::from_str::<Vec<MdblistItem>>(body) {
        Ok(entries) => entries,
        Err(_) => match serde_json::from_str::<SplitExport>(body) {
            Ok(SplitExport {
                movies: None,
                shows: None,
            }) => return Err(undecodable("object has neither movies nor shows".to_string())),
            Ok(split) => split
                .movies
                .unwrap_or_default()
                .into_iter()
                .chain(split.shows.unwrap_or_default())
                .collect(),
            Err(e) => return Err(undecodable(e.to_string())),
        },
    };

    let items: Vec<ExternalItem> = entries.iter().filter_map(to_external).collect();
    debug!("Decoded {} MDBList entries", items.len());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flat_export() {
        let body = r#"[
            {"rank":1,"title":"Heat","imdb_id":"tt0113277","id":949,"mediatype":"movie"},
            {"rank":2,"title":"The Wire","imdb_id":"tt0306414","id":"1438","mediatype":"show"},
            {"rank":3,"title":"No Ids","mediatype":"movie"}
        ]"#;
        let items = decode_list(body).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].tmdb_id.as_deref(), Some("949"));
        assert_eq!(items[1].tmdb_id.as_deref(), Some("1438"));
        assert_eq!(items[2].imdb_id, None);
        assert_eq!(items[2].tmdb_id, None);
    }

    #[test]
    fn test_decode_split_export() {
        let body = r#"{"movies":[{"title":"Heat","imdb_id":"tt0113277","id":949}],"shows":[{"title":"The Wire","id":1438}]}"#;
        let items = decode_list(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "The Wire");

        let movies_only = decode_list(r#"{"movies":[]}"#).unwrap();
        assert!(movies_only.is_empty());
    }

    #[test]
    fn test_error_payload_is_a_decode_error() {
        assert!(matches!(
            decode_list(r#"{"error":"Invalid API key"}"#),
            Err(SourceError::Decode { provider: "MDBList", .. })
        ));
        assert!(decode_list("not json").is_err());
        assert!(decode_list("[]").unwrap().is_empty());
    }
}
