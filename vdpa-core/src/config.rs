//! Configuration management.

use crate::discovery::PollPolicy;
use crate::error::{Result, VdpaError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration for the vDPA binding sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network_info_path: String,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub log_file: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network_info_path: paths::network_info_path().to_string_lossy().to_string(),
            poll_interval_ms: 100,
            poll_timeout_ms: 1000,
            log_file: paths::log_file_path().to_string_lossy().to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when it is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| VdpaError::IoError { path: path.to_path_buf(), source: e })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| VdpaError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject poll settings that would never produce a read.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(VdpaError::InvalidConfig {
                reason: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.poll_timeout_ms < self.poll_interval_ms {
            return Err(VdpaError::InvalidConfig {
                reason: format!(
                    "poll_timeout_ms ({}) must not be shorter than poll_interval_ms ({})",
                    self.poll_timeout_ms, self.poll_interval_ms
                ),
            });
        }
        Ok(())
    }

    pub fn network_info_path(&self) -> PathBuf {
        PathBuf::from(&self.network_info_path)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_millis(self.poll_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"poll_timeout_ms": 3000, "log_level": "debug"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.poll_timeout_ms, 3000);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_poll_settings_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"poll_interval_ms": 0}"#).unwrap();
        assert!(matches!(Config::load(&path), Err(VdpaError::InvalidConfig { .. })));

        std::fs::write(&path, r#"{"poll_interval_ms": 500, "poll_timeout_ms": 100}"#).unwrap();
        assert!(matches!(Config::load(&path), Err(VdpaError::InvalidConfig { .. })));
    }

    #[test]
    fn test_garbage_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load(&path), Err(VdpaError::InvalidConfig { .. })));
    }
}
