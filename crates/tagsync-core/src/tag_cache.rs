use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tagsync_models::{ProviderIds, TagSet};
use tracing::{debug, info, warn};

/// Provider id -> tags lookup used by the real-time tagger.
///
/// Keys are `imdb_<id>` / `tmdb_<id>`. The map is a hint rebuilt by every
/// full sync; the catalog stays the source of truth for applied tags.
/// Persistence failures are logged and never surfaced.
pub struct TagCache {
    path: Mutex<Option<PathBuf>>,
    entries: Mutex<HashMap<String, TagSet>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self {
            path: Mutex::new(None),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Point the cache at `path` and load whatever is stored there.
    pub fn initialize(&self, path: impl AsRef<Path>) {
        *lock(&self.path) = Some(path.as_ref().to_path_buf());
        self.load();
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn add_tag(&self, provider_key: &str, tag: &str) {
        lock(&self.entries)
            .entry(provider_key.to_lowercase())
            .or_default()
            .insert(tag);
    }

    /// Union of tags recorded under the item's IMDb and TMDb keys.
    pub fn tags_for(&self, ids: &ProviderIds) -> TagSet {
        let keys: Vec<String> = [
            ids.imdb().map(|id| format!("imdb_{}", id)),
            ids.tmdb().map(|id| format!("tmdb_{}", id)),
        ]
        .into_iter()
        .flatten()
        .map(|key| key.to_lowercase())
        .collect();

        let entries = lock(&self.entries);
        let mut tags = TagSet::new();
        for key in keys {
            if let Some(found) = entries.get(&key) {
                tags.extend(found.iter());
            }
        }
        tags
    }

    /// Swap in the entries built by `other`, keeping this cache's path.
    pub fn replace_with(&self, other: TagCache) {
        let entries = other.entries.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        *lock(&self.entries) = entries;
    }

    /// Copy `previous`'s mappings for the given tags into this cache.
    pub fn carry_over(&self, previous: &TagCache, tags: &TagSet) {
        if tags.is_empty() {
            return;
        }
        let snapshot = lock(&previous.entries).clone();
        for (key, cached) in snapshot {
            for tag in cached.iter().filter(|tag| tags.contains(tag)) {
                self.add_tag(&key, tag);
            }
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn save(&self) {
        let Some(path) = lock(&self.path).clone() else {
            debug!("Tag cache has no storage path, skipping save");
            return;
        };

        let snapshot: BTreeMap<String, Vec<String>> = lock(&self.entries)
            .iter()
            .map(|(key, tags)| (key.clone(), tags.to_vec()))
            .collect();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize tag cache: {}", e);
                return;
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create tag cache directory {:?}: {}", parent, e);
                return;
            }
        }
        match std::fs::write(&path, json) {
            Ok(_) => debug!("Tag cache saved ({} keys) to {:?}", snapshot.len(), path),
            Err(e) => warn!("Failed to write tag cache {:?}: {}", path, e),
        }
    }

    /// Replace the in-memory map with the stored one. A missing file leaves
    /// the cache untouched; a corrupt one is deleted.
    pub fn load(&self) {
        let Some(path) = lock(&self.path).clone() else {
            return;
        };
        if !path.exists() {
            debug!("Tag cache miss: {:?} does not exist", path);
            return;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read tag cache {:?}: {}", path, e);
                return;
            }
        };

        match serde_json::from_str::<HashMap<String, Vec<String>>>(&content) {
            Ok(stored) => {
                let loaded: HashMap<String, TagSet> = stored
                    .into_iter()
                    .map(|(key, tags)| (key.to_lowercase(), tags.into_iter().collect()))
                    .collect();
                info!("Tag cache loaded ({} keys)", loaded.len());
                *lock(&self.entries) = loaded;
            }
            Err(e) => {
                warn!("Tag cache corruption detected in {:?}: {}. Deleting corrupted file.", path, e);
                if let Err(rm_err) = std::fs::remove_file(&path) {
                    warn!("Failed to delete corrupted tag cache: {}", rm_err);
                }
            }
        }
    }
}

impl Default for TagCache {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(imdb: Option<&str>, tmdb: Option<&str>) -> ProviderIds {
        let mut ids = ProviderIds::new();
        if let Some(imdb) = imdb {
            ids.set("imdb", imdb);
        }
        if let Some(tmdb) = tmdb {
            ids.set("tmdb", tmdb);
        }
        ids
    }

    #[test]
    fn test_tags_for_unions_imdb_and_tmdb() {
        let cache = TagCache::new();
        cache.add_tag("imdb_tt0113277", "Heist");
        cache.add_tag("imdb_tt0113277", "heist");
        cache.add_tag("tmdb_949", "Crime");

        let tags = cache.tags_for(&ids(Some("tt0113277"), Some("949")));
        assert_eq!(tags.to_vec(), vec!["Crime".to_string(), "Heist".to_string()]);

        assert!(cache.tags_for(&ids(Some("tt0000001"), None)).is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("tag_cache.json");

        let cache = TagCache::new();
        cache.initialize(&path);
        cache.add_tag("imdb_tt1", "Oscar Winners");
        cache.save();

        let reloaded = TagCache::new();
        reloaded.initialize(&path);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.tags_for(&ids(Some("tt1"), None)).contains("oscar winners"));
    }

    #[test]
    fn test_corrupt_file_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tag_cache.json");
        std::fs::write(&path, "{ not json").unwrap();

        let cache = TagCache::new();
        cache.initialize(&path);
        assert!(cache.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_replace_with_keeps_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tag_cache.json");
        let cache = TagCache::new();
        cache.initialize(&path);
        cache.add_tag("imdb_tt_old", "Old");

        let staged = TagCache::new();
        staged.add_tag("imdb_tt_new", "New");
        cache.replace_with(staged);
        cache.save();

        assert!(cache.tags_for(&ids(Some("tt_old"), None)).is_empty());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("imdb_tt_new"));
    }

    #[test]
    fn test_carry_over_copies_only_named_tags() {
        let live = TagCache::new();
        live.add_tag("imdb_tt0113277", "Heists");
        live.add_tag("imdb_tt0113277", "Crime");
        live.add_tag("tmdb_949", "Crime");

        let staged = TagCache::new();
        staged.add_tag("imdb_tt0122690", "Heists");
        staged.carry_over(&live, &["crime"].into_iter().collect());

        let heat = staged.tags_for(&ids(Some("tt0113277"), Some("949")));
        assert_eq!(heat.to_vec(), vec!["Crime".to_string()]);
        assert!(staged.tags_for(&ids(Some("tt0122690"), None)).contains("Heists"));
    }

    #[test]
    fn test_clear() {
        let cache = TagCache::new();
        cache.add_tag("imdb_tt1", "A");
        cache.clear();
        assert!(cache.is_empty());
    }
}
