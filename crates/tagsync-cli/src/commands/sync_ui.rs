use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use tagsync_core::ProgressSink;

/// Progress bar for a sync on a terminal, structured log lines otherwise.
pub struct SyncUI {
    bar: ProgressBar,
    interactive: bool,
}

impl SyncUI {
    pub fn new() -> Self {
        let interactive = is_interactive();
        let bar = ProgressBar::new(100);
        if interactive {
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}% {msg}")
            {
                bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
            }
            bar.set_message("Starting sync...");
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bar disabled, using structured logging"
            );
        }

        Self { bar, interactive }
    }

    pub fn finish(&self, msg: &str) {
        if self.interactive {
            self.bar.finish_with_message(msg.to_string());
        }
    }

    pub fn abandon(&self) {
        if self.interactive {
            self.bar.abandon();
        }
    }
}

impl ProgressSink for SyncUI {
    fn report(&self, percent: f64) {
        let position = percent.clamp(0.0, 100.0).round() as u64;
        if position == self.bar.position() {
            return;
        }
        self.bar.set_position(position);
        if !self.interactive {
            tracing::debug!(operation = "progress", percent = position, "Sync progress update");
        }
    }

    fn phase(&self, name: &str) {
        if self.interactive {
            self.bar.set_message(name.to_string());
        } else {
            tracing::info!(operation = "progress", phase = name, percent = self.bar.position(), "Sync phase");
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
