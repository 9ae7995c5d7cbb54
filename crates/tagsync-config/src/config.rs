use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tagsync_models::ManagedRule;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default = "default_scheduler_config")]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rules: Vec<ManagedRule>,
}

/// API credentials for the list providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub trakt_client_id: String,
    #[serde(default)]
    pub mdblist_api_key: String,
}

impl ProviderConfig {
    pub fn is_trakt_configured(&self) -> bool {
        !self.trakt_client_id.trim().is_empty() && self.trakt_client_id != "YOUR_CLIENT_ID"
    }

    pub fn is_mdblist_configured(&self) -> bool {
        !self.mdblist_api_key.trim().is_empty() && self.mdblist_api_key != "YOUR_API_KEY"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Compute and report changes without touching the catalog.
    #[serde(default)]
    pub dry_run: bool,
    /// Also record debug lines in the run log shown by the status surface.
    #[serde(default)]
    pub extended_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_daily_hour")]
    pub daily_hour: u32,
    #[serde(default)]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            bind: default_bind(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_daily_hour() -> u32 {
    4
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        daily_hour: default_daily_hour(),
        run_on_startup: false,
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        default_scheduler_config()
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scheduler.daily_hour > 23 {
            return Err(anyhow::anyhow!("scheduler.daily_hour must be between 0 and 23"));
        }

        if self.server.enabled && self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!("server.bind is not a valid socket address: {}", self.server.bind));
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.tag().is_empty() {
                return Err(anyhow::anyhow!("rules[{}]: tag must not be empty", idx));
            }
            if rule.item_limit == 0 {
                return Err(anyhow::anyhow!("rules[{}] ('{}'): limit must be at least 1", idx, rule.tag()));
            }
        }

        Ok(())
    }

    /// Non-fatal problems: enabled rules pointing at a provider whose
    /// credential is missing. Those rules fail at fetch time.
    pub fn credential_warnings(&self) -> Vec<String> {
        self.enabled_rules()
            .filter_map(|rule| {
                let url = rule.source_url.trim();
                if url.is_empty() {
                    return None;
                }
                if url.to_lowercase().contains("mdblist.com") {
                    (!self.providers.is_mdblist_configured())
                        .then(|| format!("rule '{}' uses MDBList but providers.mdblist_api_key is not set", rule.tag()))
                } else {
                    (!self.providers.is_trakt_configured())
                        .then(|| format!("rule '{}' uses Trakt but providers.trakt_client_id is not set", rule.tag()))
                }
            })
            .collect()
    }

    /// Rules that are switched on, in configuration order.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &ManagedRule> {
        self.rules.iter().filter(|rule| rule.active && !rule.tag().is_empty())
    }
}
