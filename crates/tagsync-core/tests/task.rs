mod common;

use std::sync::Arc;

use common::{config, movie, rule, trakt_list, Harness};
use tagsync_core::{
    ConfigSource, HistoryStore, NoProgress, RunState, RunStatus, ScheduledTask, SyncEngine, TagSyncTask, TaskManager,
    TaskTrigger, TAG_SYNC_TASK_KEY,
};
use tagsync_sources::ListFetcher;
use tokio_util::sync::CancellationToken;

fn task_for(harness: &Harness, source: ConfigSource) -> TagSyncTask {
    let engine = SyncEngine::new(
        harness.catalog.clone(),
        ListFetcher::new(harness.http.clone()),
        harness.cache.clone(),
        HistoryStore::new(
            harness.history.tags_path().to_path_buf(),
            harness.history.groups_path().to_path_buf(),
        ),
    );
    TagSyncTask::new(Arc::new(engine), Arc::new(RunState::new()), source, 4)
}

#[tokio::test]
async fn test_task_metadata() {
    let harness = Harness::new(Vec::new()).await;
    let task = task_for(&harness, ConfigSource::Static(Box::new(config(Vec::new()))));
    assert_eq!(task.key(), TAG_SYNC_TASK_KEY);
    assert_eq!(task.display_name(), "Tag Sync: Start Sync");
    assert_eq!(task.category(), "Library");
    assert_eq!(task.default_triggers(), vec![TaskTrigger::Daily { hour: 4 }]);
    assert_eq!(task.state().status(), RunStatus::Unknown);
}

#[tokio::test]
async fn test_successful_run_records_status_and_log() {
    let harness = Harness::new(vec![movie(1, "Heat", "tt0113277")]).await;
    harness.http.respond("/lists/heists/", trakt_list(&[("Heat", "tt0113277")]));
    let task = task_for(
        &harness,
        ConfigSource::Static(Box::new(config(vec![rule("Heists", "heists", 10)]))),
    );

    let report = task.run_sync(&CancellationToken::new(), &NoProgress).await.unwrap();
    assert_eq!(report.tags_added, 1);

    let snapshot = task.state().snapshot();
    assert!(snapshot.last_run_status.starts_with("success ("));
    assert!(!snapshot.is_running);
    assert!(snapshot.log.iter().any(|line| line.contains("Phase 1: Indexing local library")));
    assert!(snapshot.log.iter().any(|line| line.contains("TAG SYNC FINISHED")));
}

#[tokio::test]
async fn test_dry_run_status() {
    let harness = Harness::new(Vec::new()).await;
    let mut dry = config(Vec::new());
    dry.sync.dry_run = true;
    let task = task_for(&harness, ConfigSource::Static(Box::new(dry)));

    task.run_sync(&CancellationToken::new(), &NoProgress).await.unwrap();
    assert!(task.state().status().to_string().starts_with("dry-run complete ("));
}

#[tokio::test]
async fn test_cancelled_run_reports_failure() {
    let harness = Harness::new(vec![movie(1, "Heat", "tt0113277")]).await;
    let task = task_for(
        &harness,
        ConfigSource::Static(Box::new(config(vec![rule("Heists", "heists", 10)]))),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(task.run_sync(&cancel, &NoProgress).await.is_err());
    let status = task.state().status().to_string();
    assert!(status.starts_with("failed: cancelled ("), "{}", status);
    assert!(!task.is_running());
}

#[tokio::test]
async fn test_invalid_config_file_reports_failure() {
    let harness = Harness::new(Vec::new()).await;
    let path = harness.dir.path().join("config.toml");
    std::fs::write(&path, "[[rules]]\ntag = \"\"\nurl = \"x\"\n").unwrap();
    let task = task_for(&harness, ConfigSource::File(path));

    assert!(task.run_sync(&CancellationToken::new(), &NoProgress).await.is_err());
    assert!(matches!(task.state().status(), RunStatus::Failed { .. }));
    assert!(task
        .state()
        .log()
        .entries()
        .iter()
        .any(|line| line.contains("CRITICAL ERROR")));
}

#[tokio::test]
async fn test_manager_triggers_registered_task() {
    let harness = Harness::new(vec![movie(1, "Heat", "tt0113277")]).await;
    harness.http.respond("/lists/heists/", trakt_list(&[("Heat", "tt0113277")]));
    let task = Arc::new(task_for(
        &harness,
        ConfigSource::Static(Box::new(config(vec![rule("Heists", "heists", 10)]))),
    ));

    let mut manager = TaskManager::new(CancellationToken::new());
    manager.register(task.clone());
    manager.trigger(TAG_SYNC_TASK_KEY).unwrap().await.unwrap();

    assert!(task.state().status().to_string().starts_with("success"));
    assert_eq!(harness.tags_of(1).await, vec!["Heists".to_string()]);
}
