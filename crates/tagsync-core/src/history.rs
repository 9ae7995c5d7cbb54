use std::path::{Path, PathBuf};

use tagsync_models::TagSet;
use tracing::{debug, warn};

/// Names of tags and groups this tool has managed in earlier runs.
///
/// Each list is a text file with one name per line. Read and write
/// failures are logged and treated as an empty history.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    tags_path: PathBuf,
    groups_path: PathBuf,
}

impl HistoryStore {
    pub fn new(tags_path: impl Into<PathBuf>, groups_path: impl Into<PathBuf>) -> Self {
        Self {
            tags_path: tags_path.into(),
            groups_path: groups_path.into(),
        }
    }

    pub fn load_tags(&self) -> TagSet {
        load_lines(&self.tags_path)
    }

    pub fn load_groups(&self) -> TagSet {
        load_lines(&self.groups_path)
    }

    pub fn save_tags(&self, tags: &TagSet) {
        save_lines(&self.tags_path, tags);
    }

    pub fn save_groups(&self, groups: &TagSet) {
        save_lines(&self.groups_path, groups);
    }

    pub fn tags_path(&self) -> &Path {
        &self.tags_path
    }

    pub fn groups_path(&self) -> &Path {
        &self.groups_path
    }
}

/// Previously managed names no longer produced by the current run.
pub fn orphans(previous: &TagSet, current: &TagSet) -> Vec<String> {
    previous.difference(current).map(str::to_string).collect()
}

fn load_lines(path: &Path) -> TagSet {
    if !path.exists() {
        debug!("History file {:?} does not exist yet", path);
        return TagSet::new();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => content.lines().map(str::trim).filter(|l| !l.is_empty()).collect(),
        Err(e) => {
            warn!("Failed to read history file {:?}: {}", path, e);
            TagSet::new()
        }
    }
}

fn save_lines(path: &Path, names: &TagSet) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create history directory {:?}: {}", parent, e);
            return;
        }
    }
    let mut content = names.to_vec().join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    match std::fs::write(path, content) {
        Ok(_) => debug!("Saved {} history entries to {:?}", names.len(), path),
        Err(e) => warn!("Failed to write history file {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_and_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::new(
            temp_dir.path().join("tag_history.txt"),
            temp_dir.path().join("group_history.txt"),
        );
        assert!(store.load_tags().is_empty());

        std::fs::write(store.tags_path(), "Oscar Winners\n\n  Old Tag  \noscar winners\n").unwrap();
        let tags = store.load_tags();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("old tag"));

        let groups: TagSet = ["Christmas"].into_iter().collect();
        store.save_groups(&groups);
        assert_eq!(std::fs::read_to_string(store.groups_path()).unwrap(), "Christmas\n");
        assert_eq!(store.load_groups(), groups);
    }

    #[test]
    fn test_orphans_case_insensitive() {
        let previous: TagSet = ["Old Tag", "Oscar Winners"].into_iter().collect();
        let current: TagSet = ["oscar winners"].into_iter().collect();
        assert_eq!(orphans(&previous, &current), vec!["Old Tag".to_string()]);
    }
}
