pub mod catalog;
pub mod engine;
pub mod history;
pub mod local_catalog;
pub mod progress;
pub mod realtime;
pub mod run_state;
pub mod schedule;
pub mod tag_cache;
pub mod task;

pub use catalog::{Catalog, CatalogError, ChangeKind, ItemChangeEvent, ItemFilter};
pub use engine::{EngineError, SyncEngine, SyncReport};
pub use history::{orphans, HistoryStore};
pub use local_catalog::LocalCatalog;
pub use progress::{NoProgress, ProgressSink};
pub use realtime::RealtimeTagger;
pub use run_state::{RunLog, RunState, RunStatus, StatusSnapshot, RUN_LOG_CAPACITY};
pub use tag_cache::TagCache;
pub use task::{ConfigSource, ScheduledTask, TagSyncTask, TaskError, TaskManager, TaskTrigger, TAG_SYNC_TASK_KEY};
