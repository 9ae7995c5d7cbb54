use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagsync_models::{Group, ItemId, ItemKind, LocalItem};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog entry {0} not found")]
    NotFound(ItemId),

    #[error("catalog I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// What happened to an item, for updates and change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemChangeEvent {
    pub kind: ChangeKind,
    pub item: LocalItem,
}

/// Selection criteria for [`Catalog::list_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    /// Empty means every kind.
    pub kinds: Vec<ItemKind>,
    pub include_virtual: bool,
    /// Exact name match, ignoring case.
    pub name: Option<String>,
}

impl ItemFilter {
    /// Movies and series that exist on disk: the set the sync manages.
    pub fn supported() -> Self {
        Self {
            kinds: ItemKind::SUPPORTED.to_vec(),
            include_virtual: false,
            name: None,
        }
    }

    pub fn matches(&self, item: &LocalItem) -> bool {
        (self.kinds.is_empty() || self.kinds.contains(&item.kind))
            && (self.include_virtual || !item.is_virtual())
            && self
                .name
                .as_deref()
                .map_or(true, |name| item.name.eq_ignore_ascii_case(name))
    }
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            include_virtual: true,
            name: None,
        }
    }
}

/// The media library the sync reconciles against.
///
/// Tags are edited on a [`LocalItem`] copy and written back with a single
/// [`Catalog::update_item`] call.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<LocalItem>, CatalogError>;

    async fn get_by_id(&self, id: ItemId) -> Result<Option<LocalItem>, CatalogError>;

    async fn update_item(&self, item: &LocalItem, kind: ChangeKind) -> Result<(), CatalogError>;

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, CatalogError>;

    async fn create_group(&self, name: &str, members: &[ItemId]) -> Result<Group, CatalogError>;

    async fn add_members(&self, group: ItemId, members: &[ItemId]) -> Result<(), CatalogError>;

    async fn list_members(&self, group: ItemId) -> Result<Vec<ItemId>, CatalogError>;

    async fn delete_group(&self, group: ItemId) -> Result<(), CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagsync_models::LocationType;

    #[test]
    fn test_supported_filter() {
        let filter = ItemFilter::supported();
        let movie = LocalItem::new(1, "Heat", ItemKind::Movie);
        let episode = LocalItem::new(2, "Pilot", ItemKind::Episode);
        let mut trailer = LocalItem::new(3, "Heat", ItemKind::Movie);
        trailer.location = LocationType::Virtual;

        assert!(filter.matches(&movie));
        assert!(!filter.matches(&episode));
        assert!(!filter.matches(&trailer));
        assert!(ItemFilter::default().matches(&trailer));
    }

    #[test]
    fn test_name_filter_ignores_case() {
        let filter = ItemFilter {
            name: Some("heat".to_string()),
            ..ItemFilter::default()
        };
        assert!(filter.matches(&LocalItem::new(1, "Heat", ItemKind::Movie)));
        assert!(!filter.matches(&LocalItem::new(2, "Ronin", ItemKind::Movie)));
    }
}
