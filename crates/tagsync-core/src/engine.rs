use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tagsync_config::Config;
use tagsync_models::{ExternalItem, ItemId, LocalItem, LocationType, ManagedRule, TagSet};
use tagsync_sources::{dedup_by_identity, ListFetcher};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::catalog::{Catalog, CatalogError, ChangeKind, ItemFilter};
use crate::history::{orphans, HistoryStore};
use crate::progress::ProgressSink;
use crate::run_state::RunLog;
use crate::schedule;
use crate::tag_cache::TagCache;

/// Share of the progress bar spent fetching rules.
const RULE_PHASE_SHARE: f64 = 80.0;
const TAG_PHASE_DONE: f64 = 90.0;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("cancelled")]
    Cancelled,

    #[error("configuration unavailable: {0}")]
    Config(String),
}

/// Counters for one reconciliation run. Dry runs report what would have
/// been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub tags_added: usize,
    pub tags_removed: usize,
    pub items_updated: usize,
    pub groups_created: usize,
    pub group_members_added: usize,
    pub groups_deleted: usize,
    pub rules_processed: usize,
    pub rules_skipped: usize,
    pub rules_failed: usize,
    pub dry_run: bool,
}

struct DesiredGroup {
    name: String,
    members: BTreeSet<ItemId>,
}

/// Desired state accumulated over the rule pass.
#[derive(Default)]
struct Plan {
    managed_tags: TagSet,
    desired_tags: HashMap<ItemId, TagSet>,
    /// Keyed by lowercased name.
    desired_groups: BTreeMap<String, DesiredGroup>,
    active_groups: TagSet,
    quarantine: TagSet,
}

impl Plan {
    fn want_tag(&mut self, item: ItemId, tag: &str) {
        self.desired_tags.entry(item).or_default().insert(tag);
    }

    fn want_member(&mut self, group: &str, item: ItemId) {
        self.desired_groups
            .entry(group.to_lowercase())
            .or_insert_with(|| DesiredGroup {
                name: group.to_string(),
                members: BTreeSet::new(),
            })
            .members
            .insert(item);
    }
}

/// Local items reachable by external id: IMDb id (lowercased) and `tmdb-<id>`.
struct CatalogIndex {
    by_key: HashMap<String, Vec<ItemId>>,
}

impl CatalogIndex {
    fn build(items: &[LocalItem]) -> Self {
        let mut by_key: HashMap<String, Vec<ItemId>> = HashMap::new();
        for item in items.iter().filter(|item| item.location == LocationType::FileSystem) {
            for key in item.provider_ids.identity_keys() {
                by_key.entry(key).or_default().push(item.id);
            }
        }
        Self { by_key }
    }

    fn lookup(&self, external: &ExternalItem) -> BTreeSet<ItemId> {
        let keys = [
            external.imdb_id.as_ref().map(|id| id.to_lowercase()),
            external.tmdb_id.as_ref().map(|id| format!("tmdb-{}", id)),
        ];
        keys.iter()
            .flatten()
            .filter_map(|key| self.by_key.get(key))
            .flatten()
            .copied()
            .collect()
    }

    fn len(&self) -> usize {
        self.by_key.len()
    }
}

/// Computes the desired tag and group state from the configured rules and
/// applies the difference to the catalog.
pub struct SyncEngine {
    catalog: Arc<dyn Catalog>,
    fetcher: ListFetcher,
    cache: Arc<TagCache>,
    history: HistoryStore,
}

impl SyncEngine {
    pub fn new(catalog: Arc<dyn Catalog>, fetcher: ListFetcher, cache: Arc<TagCache>, history: HistoryStore) -> Self {
        Self {
            catalog,
            fetcher,
            cache,
            history,
        }
    }

    /// Run one full reconciliation.
    ///
    /// Per-rule fetch failures quarantine that rule's tag and group for the
    /// run. Catalog failures abort the run; writes already made are kept.
    /// Cancellation is honoured between rules and aborts before any change
    /// is applied.
    #[instrument(skip_all, fields(dry_run = config.sync.dry_run, rules = config.rules.len()))]
    pub async fn run(
        &self,
        config: &Config,
        today: NaiveDate,
        log: &RunLog,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, EngineError> {
        let start = Instant::now();
        let dry_run = config.sync.dry_run;
        let mut report = SyncReport {
            dry_run,
            ..SyncReport::default()
        };

        log.info(format!("--- STARTING TAG SYNC (v{}) ---", env!("CARGO_PKG_VERSION")));
        if dry_run {
            log.info("!!! DRY RUN MODE - NO CHANGES WILL BE SAVED !!!");
        }

        progress.phase("Indexing local library");
        log.info("Phase 1: Indexing local library...");
        let items = self.catalog.list_items(&ItemFilter::supported()).await?;
        let index = CatalogIndex::build(&items);
        log.debug(format!("Indexed {} items under {} external ids", items.len(), index.len()));

        progress.phase("Fetching lists");
        log.info("Phase 2: Fetching lists...");
        let previous_groups = self.history.load_groups();
        let mut plan = Plan {
            managed_tags: self.history.load_tags(),
            ..Plan::default()
        };
        let staged_cache = TagCache::new();
        self.fetch_rules(config, today, &index, &mut plan, &staged_cache, &mut report, log, progress, cancel)
            .await?;

        // The real-time tagger reacts to our own writes, so it must see the
        // new mappings before any tag is removed.
        if !dry_run {
            staged_cache.carry_over(&self.cache, &plan.quarantine);
            self.cache.replace_with(staged_cache);
        }

        progress.phase("Syncing tags");
        log.info("Phase 3: Syncing tags...");
        self.apply_tags(&items, &plan, dry_run, &mut report).await?;
        log.info(format!("Tags: +{}, -{}", report.tags_added, report.tags_removed));
        progress.report(TAG_PHASE_DONE);

        progress.phase("Syncing groups");
        log.info("Phase 4: Syncing groups...");
        self.apply_groups(&plan, dry_run, &mut report, log).await?;

        progress.phase("Cleanup");
        log.info("Phase 5: Cleanup...");
        self.cleanup_groups(&previous_groups, &mut plan, dry_run, &mut report, log)
            .await?;

        if !dry_run {
            self.cache.save();
            self.history.save_tags(&plan.managed_tags);
            self.history.save_groups(&plan.active_groups);
        }

        progress.report(100.0);
        info!(
            operation = "sync_complete",
            tags_added = report.tags_added,
            tags_removed = report.tags_removed,
            groups_created = report.groups_created,
            groups_deleted = report.groups_deleted,
            rules_failed = report.rules_failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tag sync finished"
        );
        log.info("--- TAG SYNC FINISHED ---");
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn fetch_rules(
        &self,
        config: &Config,
        today: NaiveDate,
        index: &CatalogIndex,
        plan: &mut Plan,
        staged_cache: &TagCache,
        report: &mut SyncReport,
        log: &RunLog,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let step = RULE_PHASE_SHARE / config.rules.len().max(1) as f64;
        let mut done = 0.0;

        for rule in &config.rules {
            if cancel.is_cancelled() {
                log.warn("Sync cancelled before all lists were fetched; no changes applied");
                return Err(EngineError::Cancelled);
            }

            match self
                .fetch_rule(rule, config, today, index, plan, staged_cache, log, cancel)
                .await
            {
                RuleOutcome::Skipped => report.rules_skipped += 1,
                RuleOutcome::Processed => report.rules_processed += 1,
                RuleOutcome::Failed => report.rules_failed += 1,
                RuleOutcome::Cancelled => {
                    log.warn("Sync cancelled while fetching lists; no changes applied");
                    return Err(EngineError::Cancelled);
                }
            }

            done += step;
            progress.report(done);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn fetch_rule(
        &self,
        rule: &ManagedRule,
        config: &Config,
        today: NaiveDate,
        index: &CatalogIndex,
        plan: &mut Plan,
        staged_cache: &TagCache,
        log: &RunLog,
        cancel: &CancellationToken,
    ) -> RuleOutcome {
        let tag = rule.tag();
        if tag.is_empty() || !rule.active {
            return RuleOutcome::Skipped;
        }
        plan.managed_tags.insert(tag);

        if !schedule::is_active(today, &rule.activation_intervals) {
            log.debug(format!("Skipping '{}' (out of schedule).", tag));
            return RuleOutcome::Skipped;
        }

        let group = rule.effective_group_name();
        if rule.grouping_enabled {
            plan.active_groups.insert(group);
        }

        let fetched = match self
            .fetcher
            .fetch(&rule.source_url, rule.item_limit, &config.providers, cancel)
            .await
        {
            Ok(items) => dedup_by_identity(items),
            Err(e) if e.is_cancelled() => return RuleOutcome::Cancelled,
            Err(e) => {
                log.error(format!("Error fetching '{}': {}", tag, e));
                plan.quarantine.insert(tag);
                if rule.grouping_enabled {
                    plan.quarantine.insert(group);
                }
                return RuleOutcome::Failed;
            }
        };

        let mut matched = 0;
        for external in &fetched {
            if rule.is_blacklisted(external) {
                log.debug(format!("'{}': '{}' is blacklisted", tag, external.name));
                continue;
            }
            if !rule.tag_disabled {
                for key in external.provider_keys() {
                    staged_cache.add_tag(&key, tag);
                }
            }
            for item in index.lookup(external) {
                matched += 1;
                if !rule.tag_disabled {
                    plan.want_tag(item, tag);
                }
                if rule.grouping_enabled {
                    plan.want_member(group, item);
                }
            }
        }

        log.info(format!(
            "   -> [OK] '{}': {} list items, matched {} local items.",
            tag,
            fetched.len(),
            matched
        ));
        RuleOutcome::Processed
    }

    async fn apply_tags(
        &self,
        items: &[LocalItem],
        plan: &Plan,
        dry_run: bool,
        report: &mut SyncReport,
    ) -> Result<(), EngineError> {
        let empty = TagSet::new();
        for snapshot in items {
            // Lists may take a while to fetch; diff against the current copy
            // so edits made meanwhile survive the write.
            let Some(item) = self.catalog.get_by_id(snapshot.id).await? else {
                continue;
            };
            let desired = plan.desired_tags.get(&item.id).unwrap_or(&empty);

            let to_remove: Vec<String> = item
                .tags()
                .iter()
                .filter(|tag| {
                    plan.managed_tags.contains(tag) && !desired.contains(tag) && !plan.quarantine.contains(tag)
                })
                .cloned()
                .collect();
            let to_add: Vec<&str> = desired.iter().filter(|tag| !item.has_tag(tag)).collect();

            if to_remove.is_empty() && to_add.is_empty() {
                continue;
            }

            report.tags_removed += to_remove.len();
            report.tags_added += to_add.len();
            report.items_updated += 1;
            if dry_run {
                continue;
            }

            let mut updated = item;
            for tag in &to_remove {
                updated.remove_tag(tag);
            }
            for tag in &to_add {
                updated.add_tag(tag);
            }
            self.catalog.update_item(&updated, ChangeKind::Updated).await?;
        }
        Ok(())
    }

    async fn apply_groups(
        &self,
        plan: &Plan,
        dry_run: bool,
        report: &mut SyncReport,
        log: &RunLog,
    ) -> Result<(), EngineError> {
        for group in plan.desired_groups.values() {
            if group.members.is_empty() {
                continue;
            }
            let desired: Vec<ItemId> = group.members.iter().copied().collect();

            match self.catalog.find_group_by_name(&group.name).await? {
                None => {
                    report.groups_created += 1;
                    report.group_members_added += desired.len();
                    if dry_run {
                        log.debug(format!("Would create group '{}' with {} items", group.name, desired.len()));
                        continue;
                    }
                    self.catalog.create_group(&group.name, &desired).await?;
                    log.info(format!("   -> Created group '{}'.", group.name));
                }
                Some(existing) => {
                    let current: BTreeSet<ItemId> = self.catalog.list_members(existing.id).await?.into_iter().collect();
                    let missing: Vec<ItemId> = desired.into_iter().filter(|id| !current.contains(id)).collect();
                    if missing.is_empty() {
                        continue;
                    }
                    report.group_members_added += missing.len();
                    if dry_run {
                        continue;
                    }
                    self.catalog.add_members(existing.id, &missing).await?;
                    log.info(format!("   -> '{}': added {} items.", group.name, missing.len()));
                }
            }
        }
        Ok(())
    }

    async fn cleanup_groups(
        &self,
        previous_groups: &TagSet,
        plan: &mut Plan,
        dry_run: bool,
        report: &mut SyncReport,
        log: &RunLog,
    ) -> Result<(), EngineError> {
        for name in orphans(previous_groups, &plan.active_groups) {
            if plan.quarantine.contains(&name) {
                log.warn(format!("   -> Skipping cleanup of '{}' due to fetch error.", name));
                plan.active_groups.insert(&name);
                continue;
            }

            let Some(group) = self.catalog.find_group_by_name(&name).await? else {
                continue;
            };
            report.groups_deleted += 1;
            if dry_run {
                log.debug(format!("Would delete group '{}'", name));
                continue;
            }
            self.catalog.delete_group(group.id).await?;
            log.info(format!("   -> Deleted '{}' (not active/scheduled).", name));
        }
        Ok(())
    }
}

enum RuleOutcome {
    Skipped,
    Processed,
    Failed,
    Cancelled,
}
