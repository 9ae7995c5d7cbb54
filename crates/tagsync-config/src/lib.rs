pub mod config;
pub mod paths;

pub use config::{Config, ProviderConfig, SchedulerConfig, ServerConfig, SyncSettings, default_scheduler_config};
pub use paths::{PathManager, container_base_path};
