/// Receives sync progress as a percentage in `0.0..=100.0`.
///
/// Reports are monotonic within one run.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64);

    /// Short description of the current phase.
    fn phase(&self, _name: &str) {}
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: f64) {}
}
