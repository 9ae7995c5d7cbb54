use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider identifiers attached to a local catalog item.
///
/// Keys are provider names ("imdb", "tmdb", "tvdb", ...) stored lowercase so
/// that `Imdb` and `imdb` refer to the same entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ProviderIds {
    ids: BTreeMap<String, String>,
}

impl ProviderIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: &str, id: impl Into<String>) -> Self {
        self.set(provider, id);
        self
    }

    /// Set an id; blank values remove the entry.
    pub fn set(&mut self, provider: &str, id: impl Into<String>) {
        let id = id.into();
        let key = provider.trim().to_lowercase();
        if id.trim().is_empty() {
            self.ids.remove(&key);
        } else {
            self.ids.insert(key, id.trim().to_string());
        }
    }

    pub fn get(&self, provider: &str) -> Option<&str> {
        self.ids.get(&provider.to_lowercase()).map(String::as_str)
    }

    pub fn imdb(&self) -> Option<&str> {
        self.get("imdb")
    }

    pub fn tmdb(&self) -> Option<&str> {
        self.get("tmdb")
    }

    /// Fill in ids missing from `self` with the ones from `other`.
    pub fn merge(&mut self, other: &ProviderIds) {
        for (provider, id) in &other.ids {
            self.ids.entry(provider.clone()).or_insert_with(|| id.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Lookup keys used by the engine's id index: the IMDb id and `tmdb-<id>`.
    pub fn identity_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(imdb) = self.imdb() {
            keys.push(imdb.to_lowercase());
        }
        if let Some(tmdb) = self.tmdb() {
            keys.push(format!("tmdb-{}", tmdb));
        }
        keys
    }
}

impl From<BTreeMap<String, String>> for ProviderIds {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut ids = ProviderIds::new();
        for (provider, id) in map {
            ids.set(&provider, id);
        }
        ids
    }
}

impl From<ProviderIds> for BTreeMap<String, String> {
    fn from(ids: ProviderIds) -> Self {
        ids.ids
    }
}
