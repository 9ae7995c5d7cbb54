mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{config, movie, rule, trakt_list, Harness, ScriptedHttp};
use tagsync_core::{Catalog, ChangeKind, LocalCatalog, RealtimeTagger};
use tagsync_models::ItemId;
use tagsync_sources::{HttpFetch, ListRequest, SourceError};
use tokio_util::sync::CancellationToken;

/// Adds an unmanaged tag to item 1 every time a list is requested, as a user
/// editing the library during a sync would.
struct EditingHttp {
    catalog: Arc<LocalCatalog>,
    inner: Arc<ScriptedHttp>,
}

#[async_trait]
impl HttpFetch for EditingHttp {
    async fn get_text(&self, request: &ListRequest, cancel: &CancellationToken) -> Result<String, SourceError> {
        let mut item = self.catalog.get_by_id(ItemId(1)).await.unwrap().unwrap();
        item.add_tag("Favorites");
        self.catalog.update_item(&item, ChangeKind::Updated).await.unwrap();
        self.inner.get_text(request, cancel).await
    }
}

fn editing(catalog: Arc<LocalCatalog>, http: Arc<ScriptedHttp>) -> Arc<dyn HttpFetch> {
    Arc::new(EditingHttp { catalog, inner: http })
}

/// Give the real-time tagger time to drain the events of the last run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_edit_during_fetch_survives_tag_write() {
    let harness = Harness::with_fetch(vec![movie(1, "Heat", "tt0113277")], editing).await;
    harness.http.respond("/lists/heists/", trakt_list(&[("Heat", "tt0113277")]));

    let report = harness.run(&config(vec![rule("Heists", "heists", 10)])).await.unwrap();

    assert_eq!(report.tags_added, 1);
    assert_eq!(
        harness.tags_of(1).await,
        vec!["Favorites".to_string(), "Heists".to_string()]
    );
}

#[tokio::test]
async fn test_edit_during_fetch_survives_tag_removal() {
    let harness = Harness::with_fetch(vec![movie(1, "Heat", "tt0113277").with_tags(["Heists"])], editing).await;
    harness.history.save_tags(&["Heists"].into_iter().collect());
    harness.http.respond("/lists/heists/", trakt_list(&[("Ronin", "tt0122690")]));

    let report = harness.run(&config(vec![rule("Heists", "heists", 10)])).await.unwrap();

    assert_eq!(report.tags_removed, 1);
    assert_eq!(harness.tags_of(1).await, vec!["Favorites".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_realtime_tagger_does_not_restore_removed_tags() {
    let harness = Harness::new(vec![
        movie(1, "Heat", "tt0113277").with_tags(["Heists"]),
        movie(2, "Ronin", "tt0122690"),
    ])
    .await;
    harness.history.save_tags(&["Heists"].into_iter().collect());
    // Mapping left over from a run where Heat was still on the list
    harness.cache.add_tag("imdb_tt0113277", "Heists");
    harness.http.respond("/lists/heists/", trakt_list(&[("Ronin", "tt0122690")]));

    let tagger = Arc::new(RealtimeTagger::new(harness.catalog.clone(), harness.cache.clone()));
    let cancel = CancellationToken::new();
    let worker = {
        let tagger = tagger.clone();
        let events = harness.catalog.subscribe();
        let cancel = cancel.clone();
        tokio::spawn(async move { tagger.run(events, cancel).await })
    };

    let config = config(vec![rule("Heists", "heists", 10)]);
    let first = harness.run(&config).await.unwrap();
    assert_eq!(first.tags_removed, 1);
    assert_eq!(first.tags_added, 1);
    settle().await;

    assert!(harness.tags_of(1).await.is_empty());
    assert_eq!(harness.tags_of(2).await, vec!["Heists".to_string()]);
    let heat = harness.catalog.get_by_id(ItemId(1)).await.unwrap().unwrap();
    assert!(tagger.process_item(&heat).await.unwrap().is_empty());

    let writes_after_first = harness.catalog.write_count();
    let second = harness.run(&config).await.unwrap();
    settle().await;
    assert_eq!(second.tags_added, 0);
    assert_eq!(second.tags_removed, 0);
    assert_eq!(harness.catalog.write_count(), writes_after_first);

    cancel.cancel();
    worker.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_realtime_tagger_leaves_remote_items_alone() {
    let mut remote = movie(1, "Heat", "tt0113277").with_tags(["Heists"]);
    remote.location = tagsync_models::LocationType::Remote;
    let harness = Harness::new(vec![remote, movie(2, "Heat", "tt0113277")]).await;
    harness.history.save_tags(&["Heists"].into_iter().collect());
    harness.http.respond("/lists/heists/", trakt_list(&[("Heat", "tt0113277")]));

    let tagger = RealtimeTagger::new(harness.catalog.clone(), harness.cache.clone());
    let cancel = CancellationToken::new();
    let worker = {
        let events = harness.catalog.subscribe();
        let cancel = cancel.clone();
        tokio::spawn(async move { tagger.run(events, cancel).await })
    };

    let config = config(vec![rule("Heists", "heists", 10)]);
    harness.run(&config).await.unwrap();
    settle().await;
    assert!(harness.tags_of(1).await.is_empty());
    assert_eq!(harness.tags_of(2).await, vec!["Heists".to_string()]);

    let writes_after_first = harness.catalog.write_count();
    harness.run(&config).await.unwrap();
    settle().await;
    assert_eq!(harness.catalog.write_count(), writes_after_first);

    cancel.cancel();
    worker.await.unwrap();
}
