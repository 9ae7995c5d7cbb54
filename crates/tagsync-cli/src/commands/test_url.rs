use super::config::load_config;
use crate::output::{new_table, Output};
use color_eyre::Result;
use std::sync::Arc;
use tagsync_config::PathManager;
use tagsync_sources::{ListFetcher, Provider, ReqwestFetcher};
use tokio_util::sync::CancellationToken;

pub async fn run_test_url(url: &str, limit: usize, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config = load_config(&paths, output)?;

    let provider = Provider::identify(url);
    let fetcher = ListFetcher::new(Arc::new(
        ReqwestFetcher::new().map_err(|e| color_eyre::eyre::eyre!("Failed to build HTTP client: {}", e))?,
    ));
    let items = fetcher
        .fetch(url, limit.max(1), &config.providers, &CancellationToken::new())
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Error: {}", e))?;

    if !output.is_human() {
        output.json(&serde_json::json!({
            "success": !items.is_empty(),
            "provider": provider.map(|p| p.to_string()),
            "matchedCount": items.len(),
            "items": items,
        }));
        return Ok(());
    }

    if items.is_empty() {
        output.warn("Could not find any items. Check URL or API key.");
        return Ok(());
    }

    let mut table = new_table(vec!["#", "Title", "IMDb", "TMDb"]);
    for (idx, item) in items.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            item.name.clone(),
            item.imdb_id.clone().unwrap_or_default(),
            item.tmdb_id.clone().unwrap_or_default(),
        ]);
    }
    output.table(&table);
    output.success(format!("Successfully found {} items.", items.len()));
    Ok(())
}
