use crate::output::{new_table, Output};
use crate::CatalogCommands;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::path::Path;
use std::sync::Arc;
use tagsync_config::PathManager;
use tagsync_core::{Catalog, ItemFilter, LocalCatalog, RealtimeTagger, TagCache};
use tagsync_models::LocalItem;

pub async fn run_catalog(cmd: CatalogCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;
    let catalog = Arc::new(LocalCatalog::open(paths.catalog_file()).await?);

    match cmd {
        CatalogCommands::Add { file } => add_items(&paths, catalog, &file, output).await,
        CatalogCommands::List => list_items(catalog.as_ref(), output).await,
    }
}

/// Ingest items and tag each one from the cache, as the real-time tagger
/// would for a library scan.
async fn add_items(paths: &PathManager, catalog: Arc<LocalCatalog>, file: &Path, output: &Output) -> Result<()> {
    let content = std::fs::read_to_string(file).wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let items: Vec<LocalItem> =
        serde_json::from_str(&content).wrap_err_with(|| format!("{} is not a JSON array of items", file.display()))?;

    let cache = Arc::new(TagCache::new());
    cache.initialize(paths.tag_cache_file());
    let tagger = RealtimeTagger::new(catalog.clone(), cache);

    let mut rows = Vec::new();
    for item in items {
        let kind = catalog.insert_item(item.clone()).await?;
        let applied = tagger.process_item(&item).await?;
        tracing::debug!(item = %item.id, ?kind, applied = applied.len(), "Ingested catalog item");
        rows.push((item, kind, applied));
    }

    if !output.is_human() {
        let added: Vec<_> = rows
            .iter()
            .map(|(item, kind, applied)| {
                serde_json::json!({
                    "id": item.id,
                    "name": item.name,
                    "change": kind,
                    "tagsApplied": applied,
                })
            })
            .collect();
        output.json(&serde_json::json!({ "items": added }));
        return Ok(());
    }

    let mut table = new_table(vec!["Id", "Name", "Change", "Tags applied"]);
    for (item, kind, applied) in &rows {
        table.add_row(vec![
            item.id.to_string(),
            item.name.clone(),
            format!("{:?}", kind),
            applied.join(", "),
        ]);
    }
    output.table(&table);
    output.success(format!("Ingested {} items into {}", rows.len(), paths.catalog_file().display()));
    Ok(())
}

async fn list_items(catalog: &LocalCatalog, output: &Output) -> Result<()> {
    let items = catalog.list_items(&ItemFilter::default()).await?;
    let groups = catalog.groups().await;

    if !output.is_human() {
        output.json(&serde_json::json!({ "items": items, "groups": groups }));
        return Ok(());
    }

    let mut table = new_table(vec!["Id", "Name", "Kind", "Tags"]);
    for item in &items {
        table.add_row(vec![
            item.id.to_string(),
            item.name.clone(),
            format!("{:?}", item.kind),
            item.tags.join(", "),
        ]);
    }
    output.table(&table);

    if !groups.is_empty() {
        let mut group_table = new_table(vec!["Collection", "Members"]);
        for group in &groups {
            group_table.add_row(vec![group.name.clone(), group.members.len().to_string()]);
        }
        output.table(&group_table);
    }
    Ok(())
}
