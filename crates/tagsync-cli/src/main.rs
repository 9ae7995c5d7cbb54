use clap::{ArgAction, Parser, Subcommand};
use commands::{catalog, clear, config, daemon, status, sync, test_url};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "tagsync")]
#[command(about = "tagsync - Keep library tags and collections in step with MDBList and Trakt lists")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one tag sync now
    #[command(long_about = "Fetch every active rule's list, then add and remove managed tags and collections in the local catalog. Tags and collections not created by tagsync are never touched.")]
    Sync {
        /// Compute and report the changes without touching the catalog
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Run the scheduler, HTTP surface and real-time tagger
    #[command(long_about = "Run tagsync in the foreground: a daily sync at the configured hour, the HTTP query surface, and real-time tagging of catalog changes from the tag cache.")]
    Daemon {
        /// Skip the sync on startup even if scheduler.run_on_startup is set
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },
    /// Fetch a list URL and show what it resolves to
    TestUrl {
        /// MDBList or Trakt list URL
        url: String,

        /// Maximum number of items to fetch
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show managed tags, managed collections and cache size
    Status,
    /// Manage the local catalog
    Catalog {
        #[command(subcommand)]
        cmd: CatalogCommands,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Clear cached data
    #[command(long_about = "Clear the tag cache or the tag/collection history. Clearing history makes tagsync forget which tags it manages, so stale tags are no longer removed.")]
    Clear {
        /// Clear cache and history
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear the provider id -> tags cache
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Clear the managed tag and collection history
        #[arg(long, action = ArgAction::SetTrue)]
        history: bool,
    },
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Add or replace items from a JSON array file and tag them from the cache
    Add {
        /// Path to a JSON file holding an array of items
        file: std::path::PathBuf,
    },
    /// List catalog items and their tags
    List,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks credentials)
    Show {
        /// Show credentials unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);

    // The daemon installs its own subscriber with a file writer
    if !matches!(cli.command, Commands::Daemon { .. }) {
        logging::init_logging(cli.verbose, cli.quiet).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    }

    match cli.command {
        Commands::Sync { dry_run } => sync::run_sync(dry_run, &output).await,
        Commands::Daemon { no_startup_sync } => daemon::run_daemon(no_startup_sync, cli.verbose, cli.quiet, &output).await,
        Commands::TestUrl { url, limit } => test_url::run_test_url(&url, limit, &output).await,
        Commands::Status => status::run_status(&output).await,
        Commands::Catalog { cmd } => catalog::run_catalog(cmd, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output),
        Commands::Clear { all, cache, history } => clear::run_clear(all, cache, history, &output),
    }
}
