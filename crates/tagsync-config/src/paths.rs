use anyhow::Result;
use std::path::{Path, PathBuf};

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("TAGSYNC_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

#[derive(Debug, Clone)]
pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("tagsync");

        Ok(Self::with_base(base_dir))
    }

    /// Lay out config, data and logs under one directory.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn from_docker_env() -> Self {
        Self::with_base(container_base_path())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn tag_history_file(&self) -> PathBuf {
        self.data_dir.join("tag_history.txt")
    }

    pub fn group_history_file(&self) -> PathBuf {
        self.data_dir.join("group_history.txt")
    }

    pub fn tag_cache_file(&self) -> PathBuf {
        self.data_dir.join("tag_cache.json")
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    pub fn daemon_log_file(&self) -> PathBuf {
        self.log_dir.join("tagsync.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory, so its presence means Docker
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }

        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_base() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path());
        assert_eq!(paths.config_file(), dir.path().join("config.toml"));
        assert_eq!(paths.tag_history_file(), dir.path().join("data").join("tag_history.txt"));
        assert_eq!(paths.tag_cache_file(), dir.path().join("data").join("tag_cache.json"));
        assert_eq!(paths.daemon_log_file(), dir.path().join("logs").join("tagsync.log"));

        paths.ensure_directories().unwrap();
        assert!(paths.data_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
