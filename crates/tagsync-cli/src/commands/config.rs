use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::Result;
use tagsync_config::{Config, PathManager};
use tagsync_models::{ActivationInterval, ManagedRule};

/// Load and validate `config.toml`, falling back to defaults when absent.
pub fn load_config(paths: &PathManager, output: &Output) -> Result<Config> {
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

    for warning in config.credential_warnings() {
        output.warn(&warning);
    }
    Ok(config)
}

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&paths, full, output),
        ConfigCommands::Init { force } => init_config(&paths, force, output),
    }
}

fn show_config(paths: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!(
            "No configuration file at {}. Run `tagsync config init` to create one.",
            config_file.display()
        ));
    }
    let mut config = load_config(paths, output)?;

    if !full {
        config.providers.trakt_client_id = mask(&config.providers.trakt_client_id);
        config.providers.mdblist_api_key = mask(&config.providers.mdblist_api_key);
    }

    if output.is_human() {
        output.info(format!("# {}", config_file.display()));
        let rendered = toml::to_string_pretty(&config)?;
        output.info(rendered.trim_end());
    } else {
        output.json(&serde_json::to_value(&config)?);
    }
    Ok(())
}

fn init_config(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "{} already exists. Use --force to overwrite it.",
            config_file.display()
        ));
        return Ok(());
    }

    starter_config()
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote starter configuration to {}", config_file.display()));
    output.info("Set providers.trakt_client_id or providers.mdblist_api_key, then edit [[rules]].");
    Ok(())
}

fn starter_config() -> Config {
    let mut weekend = ManagedRule::new("Weekend Picks", "https://mdblist.com/lists/someone/weekend-picks", 25);
    weekend.active = false;
    weekend.activation_intervals = vec![ActivationInterval::Weekly {
        days: vec!["Saturday".to_string(), "Sunday".to_string()],
    }];

    let mut trending = ManagedRule::new("Trending", "https://trakt.tv/movies/trending", 50);
    trending.grouping_enabled = true;
    trending.group_name = "Trending Now".to_string();

    Config {
        rules: vec![trending, weekend],
        ..Config::default()
    }
}

fn mask(secret: &str) -> String {
    let secret = secret.trim();
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}
