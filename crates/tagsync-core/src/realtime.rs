use std::sync::Arc;

use tagsync_models::{LocalItem, LocationType};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError, ChangeKind, ItemChangeEvent};
use crate::tag_cache::TagCache;

/// Applies cached list tags to items as they are added or updated in the
/// catalog, between full syncs.
pub struct RealtimeTagger {
    catalog: Arc<dyn Catalog>,
    cache: Arc<TagCache>,
}

impl RealtimeTagger {
    pub fn new(catalog: Arc<dyn Catalog>, cache: Arc<TagCache>) -> Self {
        Self { catalog, cache }
    }

    /// Add every cached tag the item is missing, with at most one catalog
    /// update. Returns the tags applied.
    ///
    /// Only items on disk are tagged, the same set a full sync matches.
    pub async fn process_item(&self, item: &LocalItem) -> Result<Vec<String>, CatalogError> {
        if !item.kind.is_supported() || item.location != LocationType::FileSystem || item.provider_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tags = self.cache.tags_for(&item.provider_ids);
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut updated = item.clone();
        let mut applied = Vec::new();
        for tag in tags.iter() {
            if updated.add_tag(tag) {
                info!("[Real-Time] tagged '{}' with '{}'", item.name, tag);
                applied.push(tag.to_string());
            }
        }

        if !applied.is_empty() {
            self.catalog.update_item(&updated, ChangeKind::Updated).await?;
        }
        Ok(applied)
    }

    /// Consume catalog change events until the channel closes or `cancel`
    /// fires.
    pub async fn run(&self, mut events: broadcast::Receiver<ItemChangeEvent>, cancel: CancellationToken) {
        info!(operation = "realtime_start", "Real-time tagger listening for catalog changes");
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Ok(event) => self.handle(event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Real-time tagger fell behind, skipped {} catalog events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Real-time tagger stopped");
    }

    async fn handle(&self, event: ItemChangeEvent) {
        // The event carries a snapshot; tag the catalog's current copy.
        let item = match self.catalog.get_by_id(event.item.id).await {
            Ok(Some(current)) => current,
            Ok(None) => return,
            Err(e) => {
                warn!("Real-time tagger could not load item {}: {}", event.item.id, e);
                return;
            }
        };
        if let Err(e) = self.process_item(&item).await {
            warn!("Real-time tagging of '{}' failed: {}", item.name, e);
        }
    }
}
