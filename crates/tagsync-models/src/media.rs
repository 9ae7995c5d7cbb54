use serde::{Deserialize, Serialize};
use std::fmt;

use crate::media_ids::ProviderIds;

/// Internal identity of a catalog entry (items and groups share the space).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Movie,
    Series,
    Episode,
    Other,
}

impl ItemKind {
    /// Kinds the tag sync manages.
    pub const SUPPORTED: [ItemKind; 2] = [ItemKind::Movie, ItemKind::Series];

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[default]
    FileSystem,
    Remote,
    Virtual,
}

/// A movie or series owned by the local catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalItem {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub provider_ids: ProviderIds,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: LocationType,
}

impl LocalItem {
    pub fn new(id: u64, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId(id),
            name: name.into(),
            kind,
            provider_ids: ProviderIds::new(),
            tags: Vec::new(),
            location: LocationType::FileSystem,
        }
    }

    pub fn with_provider_id(mut self, provider: &str, id: impl Into<String>) -> Self {
        self.provider_ids.set(provider, id);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_virtual(&self) -> bool {
        self.location == LocationType::Virtual
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Add a tag unless an equal one (ignoring case) is present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if tag.trim().is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.trim().to_string());
        true
    }

    /// Remove every spelling of a tag.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        self.tags.len() != before
    }
}

/// A curated grouping (collection / box set) in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<ItemId>,
}
