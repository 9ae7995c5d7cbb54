use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

/// Terminal output that follows `--output` and `--quiet`.
///
/// In JSON modes every message becomes one `{"type", "message"}` object.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        if self.is_human() {
            println!("{} {}", "✓".green(), msg.as_ref());
        } else {
            self.message("success", msg.as_ref());
        }
    }

    /// Shown even in quiet mode.
    pub fn error(&self, msg: impl AsRef<str>) {
        if self.is_human() {
            eprintln!("{} {}", "✗".red(), msg.as_ref());
        } else {
            self.message("error", msg.as_ref());
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        if self.is_human() {
            println!("{}", msg.as_ref());
        } else {
            self.message("info", msg.as_ref());
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        if self.is_human() {
            println!("{} {}", "⚠".yellow(), msg.as_ref());
        } else {
            self.message("warning", msg.as_ref());
        }
    }

    /// Print a table in human mode. JSON callers emit their own document.
    pub fn table(&self, table: &Table) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("{}", table);
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && !self.is_human() {
            return;
        }
        self.print_json(data);
    }

    fn message(&self, kind: &str, msg: &str) {
        self.print_json(&json!({ "type": kind, "message": msg }));
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(data).unwrap_or_default()),
            OutputFormat::Json | OutputFormat::Human => println!("{}", serde_json::to_string(data).unwrap_or_default()),
        }
    }
}

/// A table with the house style and the given header row.
pub fn new_table(header: impl Into<comfy_table::Row>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
