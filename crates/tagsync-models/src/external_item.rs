use serde::{Deserialize, Serialize};

/// An entry of a remote ranked list, normalized across providers.
///
/// Produced fresh on every fetch and never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalItem {
    pub name: String,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
}

impl ExternalItem {
    pub fn new(name: impl Into<String>, imdb_id: Option<String>, tmdb_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            imdb_id: imdb_id.filter(|id| !id.trim().is_empty()),
            tmdb_id: tmdb_id.filter(|id| !id.trim().is_empty()),
        }
    }

    /// Identity key: the IMDb id if present, otherwise `tmdb-<id>`.
    ///
    /// Returns `None` when the item carries neither id.
    pub fn identity_key(&self) -> Option<String> {
        self.imdb_id
            .clone()
            .or_else(|| self.tmdb_id.as_ref().map(|id| format!("tmdb-{}", id)))
    }

    /// Cache keys under which this item's tags are recorded (`imdb_*`, `tmdb_*`).
    pub fn provider_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(imdb) = &self.imdb_id {
            keys.push(format!("imdb_{}", imdb));
        }
        if let Some(tmdb) = &self.tmdb_id {
            keys.push(format!("tmdb_{}", tmdb));
        }
        keys
    }

    /// Whether a blacklist entry refers to this item.
    ///
    /// Entries are compared against the IMDb id and the TMDb id (bare or as
    /// `tmdb-<id>`), ignoring case. Names are never matched.
    pub fn is_blacklisted_by(&self, entry: &str) -> bool {
        let entry = entry.trim();
        if entry.is_empty() {
            return false;
        }
        let matches = |candidate: &Option<String>| {
            candidate
                .as_deref()
                .map(|id| id.eq_ignore_ascii_case(entry))
                .unwrap_or(false)
        };
        let prefixed_tmdb = self.tmdb_id.as_ref().map(|id| format!("tmdb-{}", id));
        matches(&self.imdb_id) || matches(&self.tmdb_id) || matches(&prefixed_tmdb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_prefers_imdb() {
        let item = ExternalItem::new("Heat", Some("tt0113277".to_string()), Some("949".to_string()));
        assert_eq!(item.identity_key().as_deref(), Some("tt0113277"));

        let tmdb_only = ExternalItem::new("Heat", None, Some("949".to_string()));
        assert_eq!(tmdb_only.identity_key().as_deref(), Some("tmdb-949"));

        let none = ExternalItem::new("Heat", Some("  ".to_string()), None);
        assert_eq!(none.identity_key(), None);
    }

    #[test]
    fn test_provider_keys() {
        let item = ExternalItem::new("Heat", Some("tt0113277".to_string()), Some("949".to_string()));
        assert_eq!(item.provider_keys(), vec!["imdb_tt0113277", "tmdb_949"]);
    }

    #[test]
    fn test_blacklist_matches_ids_not_names() {
        let item = ExternalItem::new("Heat", Some("tt0113277".to_string()), Some("949".to_string()));
        assert!(item.is_blacklisted_by("TT0113277"));
        assert!(item.is_blacklisted_by("949"));
        assert!(item.is_blacklisted_by("tmdb-949"));
        assert!(!item.is_blacklisted_by("Heat"));
        assert!(!item.is_blacklisted_by(""));
        assert!(!item.is_blacklisted_by("tt0000001"));
    }
}
