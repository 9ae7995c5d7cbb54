#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tagsync_config::{Config, ProviderConfig};
use tagsync_core::{EngineError, HistoryStore, LocalCatalog, NoProgress, RunLog, SyncEngine, SyncReport, TagCache};
use tagsync_models::{ItemKind, LocalItem, ManagedRule};
use tagsync_sources::{HttpFetch, ListFetcher, ListRequest, SourceError};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Answers requests whose URL contains a registered fragment.
#[derive(Default)]
pub struct ScriptedHttp {
    routes: Mutex<Vec<(String, Result<String, String>)>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    pub fn respond(&self, fragment: &str, body: String) {
        self.routes.lock().unwrap().push((fragment.to_string(), Ok(body)));
    }

    pub fn fail(&self, fragment: &str, reason: &str) {
        self.routes.lock().unwrap().push((fragment.to_string(), Err(reason.to_string())));
    }

    pub fn requests(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for ScriptedHttp {
    async fn get_text(&self, request: &ListRequest, _cancel: &CancellationToken) -> Result<String, SourceError> {
        self.seen.lock().unwrap().push(request.url.clone());
        let routes = self.routes.lock().unwrap();
        match routes.iter().rev().find(|(fragment, _)| request.url.contains(fragment.as_str())) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(reason))) => Err(SourceError::Transport(reason.clone())),
            None => Err(SourceError::Status {
                url: request.url.clone(),
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Wrapped Trakt list body from `(title, imdb id)` pairs.
pub fn trakt_list(entries: &[(&str, &str)]) -> String {
    let rows: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(rank, (title, imdb))| {
            format!(
                r#"{{"rank":{},"type":"movie","movie":{{"title":"{}","ids":{{"imdb":"{}"}}}}}}"#,
                rank + 1,
                title,
                imdb
            )
        })
        .collect();
    format!("[{}]", rows.join(","))
}

pub fn movie(id: u64, name: &str, imdb: &str) -> LocalItem {
    LocalItem::new(id, name, ItemKind::Movie).with_provider_id("imdb", imdb)
}

pub fn rule(tag: &str, list: &str, limit: usize) -> ManagedRule {
    ManagedRule::new(tag, format!("https://trakt.tv/users/curator/lists/{}", list), limit)
}

pub fn config(rules: Vec<ManagedRule>) -> Config {
    Config {
        providers: ProviderConfig {
            trakt_client_id: "client".to_string(),
            mdblist_api_key: "key".to_string(),
        },
        rules,
        ..Config::default()
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
}

pub struct Harness {
    pub dir: TempDir,
    pub catalog: Arc<LocalCatalog>,
    pub http: Arc<ScriptedHttp>,
    pub cache: Arc<TagCache>,
    pub history: HistoryStore,
    pub engine: SyncEngine,
    pub log: RunLog,
}

impl Harness {
    pub async fn new(items: Vec<LocalItem>) -> Self {
        Self::with_fetch(items, |_, http| http as Arc<dyn HttpFetch>).await
    }

    /// Like [`Harness::new`], but lets the test wrap the scripted transport,
    /// e.g. to touch the catalog while a list is being fetched.
    pub async fn with_fetch<F>(items: Vec<LocalItem>, wrap: F) -> Self
    where
        F: FnOnce(Arc<LocalCatalog>, Arc<ScriptedHttp>) -> Arc<dyn HttpFetch>,
    {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(LocalCatalog::in_memory());
        for item in items {
            catalog.insert_item(item).await.unwrap();
        }
        let http = Arc::new(ScriptedHttp::default());
        let cache = Arc::new(TagCache::new());
        cache.initialize(dir.path().join("tag_cache.json"));
        let history = HistoryStore::new(dir.path().join("tag_history.txt"), dir.path().join("group_history.txt"));
        let engine = SyncEngine::new(
            catalog.clone(),
            ListFetcher::new(wrap(catalog.clone(), http.clone())),
            cache.clone(),
            history.clone(),
        );
        Self {
            dir,
            catalog,
            http,
            cache,
            history,
            engine,
            log: RunLog::new(),
        }
    }

    pub async fn run(&self, config: &Config) -> Result<SyncReport, EngineError> {
        self.engine
            .run(config, today(), &self.log, &NoProgress, &CancellationToken::new())
            .await
    }

    pub async fn tags_of(&self, id: u64) -> Vec<String> {
        use tagsync_core::Catalog;
        self.catalog
            .get_by_id(tagsync_models::ItemId(id))
            .await
            .unwrap()
            .unwrap()
            .tags
    }
}
