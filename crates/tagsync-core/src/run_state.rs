use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Entries kept by [`RunLog`].
pub const RUN_LOG_CAPACITY: usize = 200;

/// Outcome of the most recent sync.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Unknown,
    Running,
    Success { at: DateTime<Local> },
    DryRunComplete { at: DateTime<Local> },
    Failed { reason: String, at: DateTime<Local> },
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Unknown => write!(f, "unknown"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Success { at } => write!(f, "success ({})", at.format("%H:%M")),
            RunStatus::DryRunComplete { at } => write!(f, "dry-run complete ({})", at.format("%H:%M")),
            RunStatus::Failed { reason, at } => {
                write!(f, "failed: {} ({})", reason, at.format("%Y-%m-%d %H:%M"))
            }
        }
    }
}

/// Bounded buffer of human-readable run messages, shown by the status
/// surfaces. Every line is also emitted through `tracing`.
#[derive(Debug)]
pub struct RunLog {
    entries: Mutex<VecDeque<String>>,
    extended: AtomicBool,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(RUN_LOG_CAPACITY)),
            extended: AtomicBool::new(false),
        }
    }

    /// Whether [`RunLog::debug`] lines are kept.
    pub fn set_extended(&self, extended: bool) {
        self.extended.store(extended, Ordering::Relaxed);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        info!("{}", message.as_ref());
        self.push(message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        warn!("{}", message.as_ref());
        self.push(message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        error!("{}", message.as_ref());
        self.push(message.as_ref());
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        debug!("{}", message.as_ref());
        if self.extended.load(Ordering::Relaxed) {
            self.push(&format!("[DEBUG] {}", message.as_ref()));
        }
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).iter().cloned().collect()
    }

    fn push(&self, message: &str) {
        let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
        let mut entries = lock(&self.entries);
        if entries.len() == RUN_LOG_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(line);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-flight flag, last status and log of the sync task.
#[derive(Debug)]
pub struct RunState {
    running: AtomicBool,
    status: Mutex<RunStatus>,
    log: RunLog,
}

/// Clears the running flag when dropped.
#[must_use]
pub struct RunGuard<'a> {
    state: &'a RunState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.running.store(false, Ordering::SeqCst);
    }
}

/// Serializable view for the status surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub last_run_status: String,
    pub is_running: bool,
    pub log: Vec<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            status: Mutex::new(RunStatus::Unknown),
            log: RunLog::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claim the run slot. Returns `None` if a run is already in flight.
    pub fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard { state: self })
    }

    pub fn status(&self) -> RunStatus {
        lock(&self.status).clone()
    }

    pub fn set_status(&self, status: RunStatus) {
        *lock(&self.status) = status;
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            last_run_status: self.status().to_string(),
            is_running: self.is_running(),
            log: self.log.entries(),
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
