//! HTTP query surface for the configuration UI: test a list URL, start a
//! sync, read the last run status.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tagsync_core::{ConfigSource, RunState, StatusSnapshot, TaskError, TaskManager, TAG_SYNC_TASK_KEY};
use tagsync_sources::ListFetcher;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_TEST_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: ListFetcher,
    pub config: ConfigSource,
    pub tasks: Arc<TaskManager>,
    pub run_state: Arc<RunState>,
}

#[derive(Debug, Deserialize)]
struct TestUrlQuery {
    #[serde(default)]
    url: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestUrlResponse {
    pub success: bool,
    pub message: String,
    pub matched_count: usize,
}

impl TestUrlResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            matched_count: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSyncResponse {
    pub success: bool,
    pub message: String,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/tagsync/test-url", get(test_url_handler))
        .route("/tagsync/run", post(run_sync_handler))
        .route("/tagsync/status", get(status_handler))
        .with_state(Arc::new(state))
}

/// Serve [`app`] on `bind` until `shutdown` is cancelled.
pub async fn serve(bind: &str, state: AppState, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr: SocketAddr = bind.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(operation = "web_start", bind = %addr, "HTTP query surface listening on {}", addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn test_url_handler(State(state): State<Arc<AppState>>, Query(query): Query<TestUrlQuery>) -> Json<TestUrlResponse> {
    let config = match state.config.load() {
        Ok(config) => config,
        Err(e) => return Json(TestUrlResponse::failure(format!("Configuration not available: {}", e))),
    };
    let limit = query.limit.filter(|limit| *limit > 0).unwrap_or(DEFAULT_TEST_LIMIT);

    let response = match state
        .fetcher
        .fetch(&query.url, limit, &config.providers, &CancellationToken::new())
        .await
    {
        Ok(items) if items.is_empty() => TestUrlResponse::failure("Could not find any items. Check URL or API key."),
        Ok(items) => TestUrlResponse {
            success: true,
            message: format!("Successfully found {} items.", items.len()),
            matched_count: items.len(),
        },
        Err(e) => {
            warn!("Test of list URL failed: {}", e);
            TestUrlResponse::failure(format!("Error: {}", e))
        }
    };
    Json(response)
}

async fn run_sync_handler(State(state): State<Arc<AppState>>) -> Json<RunSyncResponse> {
    let response = match state.tasks.trigger(TAG_SYNC_TASK_KEY) {
        Ok(_) => RunSyncResponse {
            success: true,
            message: "Tag sync started successfully.".to_string(),
        },
        Err(TaskError::NotFound(_)) => RunSyncResponse {
            success: false,
            message: "Could not find tag sync task.".to_string(),
        },
        Err(e) => RunSyncResponse {
            success: false,
            message: e.to_string(),
        },
    };
    Json(response)
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.run_state.snapshot())
}
