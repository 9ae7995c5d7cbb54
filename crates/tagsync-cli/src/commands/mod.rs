pub mod catalog;
pub mod clear;
pub mod config;
pub mod daemon;
pub mod status;
pub mod sync;
pub mod sync_ui;
pub mod test_url;

use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tagsync_config::PathManager;
use tagsync_core::{ConfigSource, HistoryStore, LocalCatalog, RunState, SyncEngine, TagCache, TagSyncTask};
use tagsync_sources::{ListFetcher, ReqwestFetcher};

/// Everything a command needs to run syncs against the on-disk state.
pub struct AppContext {
    pub catalog: Arc<LocalCatalog>,
    pub cache: Arc<TagCache>,
    pub fetcher: ListFetcher,
    pub run_state: Arc<RunState>,
    pub task: Arc<TagSyncTask>,
}

impl AppContext {
    pub async fn open(paths: &PathManager, config: ConfigSource, daily_hour: u32) -> Result<Self> {
        paths
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

        let catalog_file = paths.catalog_file();
        let catalog = Arc::new(
            LocalCatalog::open(&catalog_file)
                .await
                .wrap_err_with(|| format!("Failed to open catalog at {}", catalog_file.display()))?,
        );

        let cache = Arc::new(TagCache::new());
        cache.initialize(paths.tag_cache_file());

        let fetcher = ListFetcher::new(Arc::new(ReqwestFetcher::new().wrap_err("Failed to build HTTP client")?));
        let history = HistoryStore::new(paths.tag_history_file(), paths.group_history_file());
        let engine = Arc::new(SyncEngine::new(catalog.clone(), fetcher.clone(), cache.clone(), history));

        let run_state = Arc::new(RunState::new());
        let task = Arc::new(TagSyncTask::new(engine, run_state.clone(), config, daily_hour));

        Ok(Self {
            catalog,
            cache,
            fetcher,
            run_state,
            task,
        })
    }
}
