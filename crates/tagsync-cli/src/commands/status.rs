use crate::output::{new_table, Output};
use color_eyre::Result;
use tagsync_config::PathManager;
use tagsync_core::{HistoryStore, LocalCatalog, TagCache};

/// Summarize what tagsync currently manages, read from the data directory.
pub async fn run_status(output: &Output) -> Result<()> {
    let paths = PathManager::default();

    let history = HistoryStore::new(paths.tag_history_file(), paths.group_history_file());
    let tags = history.load_tags();
    let groups = history.load_groups();

    let cache = TagCache::new();
    cache.initialize(paths.tag_cache_file());

    let catalog_file = paths.catalog_file();
    let catalog_items = if catalog_file.exists() {
        Some(LocalCatalog::open(&catalog_file).await?.item_count().await)
    } else {
        None
    };

    if !output.is_human() {
        output.json(&serde_json::json!({
            "managedTags": tags.iter().collect::<Vec<_>>(),
            "managedGroups": groups.iter().collect::<Vec<_>>(),
            "cachedProviderIds": cache.len(),
            "catalogItems": catalog_items,
            "dataDir": paths.data_dir().display().to_string(),
        }));
        return Ok(());
    }

    let mut table = new_table(vec!["", "Value"]);
    table.add_row(vec!["Data directory".to_string(), paths.data_dir().display().to_string()]);
    table.add_row(vec!["Managed tags".to_string(), join_or_dash(tags.iter())]);
    table.add_row(vec!["Managed collections".to_string(), join_or_dash(groups.iter())]);
    table.add_row(vec!["Cached provider ids".to_string(), cache.len().to_string()]);
    table.add_row(vec![
        "Catalog items".to_string(),
        catalog_items.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
    ]);
    output.table(&table);
    Ok(())
}

fn join_or_dash<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
