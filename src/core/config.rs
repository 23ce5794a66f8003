use crate::core::dirs::get_config_file;
use crate::core::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Binary used for every toolchain invocation
    pub git_binary: PathBuf,
    /// Number of commits kept in each session's cached history window
    pub log_window: usize,
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    /// Default limit for pull/push; 0 disables it
    pub network_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            log_window: 100,
            idle_timeout_secs: 600,
            sweep_interval_secs: 30,
            network_timeout_secs: 120,
        }
    }
}

impl SyncConfig {
    /// Load the user configuration, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let config_file = get_config_file();
        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SyncError::config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.git_binary.as_os_str().is_empty() {
            return Err(SyncError::config("git_binary must not be empty"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(SyncError::config("sweep_interval_secs must be positive"));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn network_timeout(&self) -> Option<Duration> {
        (self.network_timeout_secs > 0).then(|| Duration::from_secs(self.network_timeout_secs))
    }
}
