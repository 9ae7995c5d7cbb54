use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagsync_models::{Group, ItemId, LocalItem};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError, ChangeKind, ItemChangeEvent, ItemFilter};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct CatalogState {
    items: BTreeMap<ItemId, LocalItem>,
    groups: BTreeMap<ItemId, Group>,
}

impl CatalogState {
    fn next_id(&self) -> ItemId {
        let max_item = self.items.keys().next_back().map_or(0, |id| id.0);
        let max_group = self.groups.keys().next_back().map_or(0, |id| id.0);
        ItemId(max_item.max(max_group) + 1)
    }
}

/// On-disk shape: plain lists, so hand-written files stay readable.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<LocalItem>,
    #[serde(default)]
    groups: Vec<Group>,
}

impl From<CatalogFile> for CatalogState {
    fn from(file: CatalogFile) -> Self {
        Self {
            items: file.items.into_iter().map(|item| (item.id, item)).collect(),
            groups: file.groups.into_iter().map(|group| (group.id, group)).collect(),
        }
    }
}

impl From<&CatalogState> for CatalogFile {
    fn from(state: &CatalogState) -> Self {
        Self {
            items: state.items.values().cloned().collect(),
            groups: state.groups.values().cloned().collect(),
        }
    }
}

/// In-memory [`Catalog`], optionally persisted to a JSON file after every
/// mutation. Item additions and updates are broadcast to subscribers.
pub struct LocalCatalog {
    state: RwLock<CatalogState>,
    path: Option<PathBuf>,
    events: broadcast::Sender<ItemChangeEvent>,
    writes: AtomicUsize,
}

impl LocalCatalog {
    pub fn in_memory() -> Self {
        Self::with_state(CatalogState::default(), None)
    }

    /// Open the catalog stored at `path`, starting empty if it does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let file: CatalogFile = serde_json::from_str(&content)?;
            info!(
                "Loaded catalog from {:?} ({} items, {} groups)",
                path,
                file.items.len(),
                file.groups.len()
            );
            CatalogState::from(file)
        } else {
            debug!("Catalog file {:?} does not exist, starting empty", path);
            CatalogState::default()
        };
        Ok(Self::with_state(state, Some(path)))
    }

    fn with_state(state: CatalogState, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(state),
            path,
            events,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ItemChangeEvent> {
        self.events.subscribe()
    }

    /// Number of mutating calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Add a new item, or replace the one with the same id. Publishes
    /// `Added` for new ids and `Updated` otherwise.
    pub async fn insert_item(&self, item: LocalItem) -> Result<ChangeKind, CatalogError> {
        let kind = {
            let mut state = self.state.write().await;
            let kind = if state.items.contains_key(&item.id) {
                ChangeKind::Updated
            } else {
                ChangeKind::Added
            };
            state.items.insert(item.id, item.clone());
            self.persist(&state).await?;
            kind
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.publish(kind, item);
        Ok(kind)
    }

    pub async fn groups(&self) -> Vec<Group> {
        self.state.read().await.groups.values().cloned().collect()
    }

    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    fn publish(&self, kind: ChangeKind, item: LocalItem) {
        // No subscribers is fine
        let _ = self.events.send(ItemChangeEvent { kind, item });
    }

    async fn persist(&self, state: &CatalogState) -> Result<(), CatalogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&CatalogFile::from(state))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for LocalCatalog {
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<LocalItem>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.items.values().filter(|item| filter.matches(item)).cloned().collect())
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Option<LocalItem>, CatalogError> {
        Ok(self.state.read().await.items.get(&id).cloned())
    }

    async fn update_item(&self, item: &LocalItem, kind: ChangeKind) -> Result<(), CatalogError> {
        {
            let mut state = self.state.write().await;
            let slot = state.items.get_mut(&item.id).ok_or(CatalogError::NotFound(item.id))?;
            *slot = item.clone();
            self.persist(&state).await?;
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.publish(kind, item.clone());
        Ok(())
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|group| group.name == name).cloned())
    }

    async fn create_group(&self, name: &str, members: &[ItemId]) -> Result<Group, CatalogError> {
        let group = {
            let mut state = self.state.write().await;
            let mut unique = members.to_vec();
            unique.sort();
            unique.dedup();
            let group = Group {
                id: state.next_id(),
                name: name.to_string(),
                members: unique,
            };
            state.groups.insert(group.id, group.clone());
            self.persist(&state).await?;
            group
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!("Created group '{}' ({}) with {} members", group.name, group.id, group.members.len());
        Ok(group)
    }

    async fn add_members(&self, group: ItemId, members: &[ItemId]) -> Result<(), CatalogError> {
        {
            let mut state = self.state.write().await;
            let entry = state.groups.get_mut(&group).ok_or(CatalogError::NotFound(group))?;
            for member in members {
                if !entry.members.contains(member) {
                    entry.members.push(*member);
                }
            }
            self.persist(&state).await?;
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_members(&self, group: ItemId) -> Result<Vec<ItemId>, CatalogError> {
        let state = self.state.read().await;
        let entry = state.groups.get(&group).ok_or(CatalogError::NotFound(group))?;
        // Virtual or removed items are not reported as members
        Ok(entry
            .members
            .iter()
            .filter(|id| state.items.get(*id).is_some_and(|item| !item.is_virtual()))
            .copied()
            .collect())
    }

    async fn delete_group(&self, group: ItemId) -> Result<(), CatalogError> {
        {
            let mut state = self.state.write().await;
            if state.groups.remove(&group).is_none() {
                warn!("Group {} vanished before deletion", group);
                return Err(CatalogError::NotFound(group));
            }
            self.persist(&state).await?;
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
