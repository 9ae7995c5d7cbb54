use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use tagsync_config::Config;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::engine::{EngineError, SyncEngine, SyncReport};
use crate::progress::{NoProgress, ProgressSink};
use crate::run_state::{RunState, RunStatus};

pub const TAG_SYNC_TASK_KEY: &str = "TagSyncTask";

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no scheduled task with key '{0}'")]
    NotFound(String),

    #[error("task '{0}' is already running")]
    AlreadyRunning(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// When a task fires on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskTrigger {
    /// Every day at `hour:00` local time.
    Daily { hour: u32 },
}

impl TaskTrigger {
    /// Six-field cron expression (with seconds) for this trigger.
    pub fn cron_expression(&self) -> String {
        match self {
            TaskTrigger::Daily { hour } => format!("0 0 {} * * *", hour),
        }
    }
}

/// A unit of work the scheduler and the run-now surface can start.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    fn key(&self) -> &str;
    fn display_name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> &str;
    fn default_triggers(&self) -> Vec<TaskTrigger>;
    fn is_running(&self) -> bool;

    async fn execute(&self, cancel: &CancellationToken, progress: &dyn ProgressSink) -> Result<(), TaskError>;
}

/// Where a run reads its configuration from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Static(Box<Config>),
    /// Re-read on every run so edits apply without a restart.
    File(PathBuf),
}

impl ConfigSource {
    pub fn load(&self) -> Result<Config, EngineError> {
        let config = match self {
            ConfigSource::Static(config) => config.as_ref().clone(),
            ConfigSource::File(path) => {
                Config::load_or_default(path).map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?
            }
        };
        config.validate().map_err(|e| EngineError::Config(e.to_string()))?;
        for warning in config.credential_warnings() {
            warn!("{}", warning);
        }
        Ok(config)
    }
}

/// The full tag sync as a scheduled task.
pub struct TagSyncTask {
    engine: Arc<SyncEngine>,
    state: Arc<RunState>,
    config: ConfigSource,
    daily_hour: u32,
}

impl TagSyncTask {
    pub fn new(engine: Arc<SyncEngine>, state: Arc<RunState>, config: ConfigSource, daily_hour: u32) -> Self {
        Self {
            engine,
            state,
            config,
            daily_hour,
        }
    }

    pub fn state(&self) -> &Arc<RunState> {
        &self.state
    }

    /// Run one sync, recording status and log lines in the run state.
    pub async fn run_sync(
        &self,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<SyncReport, TaskError> {
        let _guard = self
            .state
            .try_begin()
            .ok_or_else(|| TaskError::AlreadyRunning(self.key().to_string()))?;

        let log = self.state.log();
        log.clear();
        self.state.set_status(RunStatus::Running);

        let result = match self.config.load() {
            Ok(config) => {
                log.set_extended(config.sync.extended_logging);
                self.engine
                    .run(&config, Local::now().date_naive(), log, progress, cancel)
                    .await
            }
            Err(e) => Err(e),
        };
        progress.report(100.0);

        let at = Local::now();
        match &result {
            Ok(report) if report.dry_run => self.state.set_status(RunStatus::DryRunComplete { at }),
            Ok(_) => self.state.set_status(RunStatus::Success { at }),
            Err(e) => {
                log.error(format!("CRITICAL ERROR: {}", e));
                self.state.set_status(RunStatus::Failed {
                    reason: e.to_string(),
                    at,
                });
            }
        }
        Ok(result?)
    }
}

#[async_trait]
impl ScheduledTask for TagSyncTask {
    fn key(&self) -> &str {
        TAG_SYNC_TASK_KEY
    }

    fn display_name(&self) -> &str {
        "Tag Sync: Start Sync"
    }

    fn description(&self) -> &str {
        "Syncs tags and groups from MDBList and Trakt lists based on configuration."
    }

    fn category(&self) -> &str {
        "Library"
    }

    fn default_triggers(&self) -> Vec<TaskTrigger> {
        vec![TaskTrigger::Daily { hour: self.daily_hour }]
    }

    fn is_running(&self) -> bool {
        self.state.is_running()
    }

    async fn execute(&self, cancel: &CancellationToken, progress: &dyn ProgressSink) -> Result<(), TaskError> {
        self.run_sync(cancel, progress).await.map(|_| ())
    }
}

/// Registry of scheduled tasks, looked up by key.
pub struct TaskManager {
    tasks: BTreeMap<String, Arc<dyn ScheduledTask>>,
    cancel: CancellationToken,
}

impl TaskManager {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            tasks: BTreeMap::new(),
            cancel,
        }
    }

    pub fn register(&mut self, task: Arc<dyn ScheduledTask>) {
        info!(operation = "task_register", key = task.key(), "Registered task '{}'", task.display_name());
        self.tasks.insert(task.key().to_string(), task);
    }

    pub fn find(&self, key: &str) -> Option<Arc<dyn ScheduledTask>> {
        self.tasks.get(key).cloned()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Arc<dyn ScheduledTask>> {
        self.tasks.values()
    }

    /// Start `key` in the background. Busy tasks are rejected rather than
    /// queued.
    pub fn trigger(&self, key: &str) -> Result<JoinHandle<()>, TaskError> {
        let task = self.find(key).ok_or_else(|| TaskError::NotFound(key.to_string()))?;
        if task.is_running() {
            return Err(TaskError::AlreadyRunning(key.to_string()));
        }

        let cancel = self.cancel.child_token();
        info!(operation = "task_trigger", key = key, "Starting task '{}'", task.display_name());
        Ok(tokio::spawn(async move {
            if let Err(e) = task.execute(&cancel, &NoProgress).await {
                error!(operation = "task_execute", key = task.key(), error = %e, "Task failed");
            }
        }))
    }

    /// Cancel every running task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
