//! Graph configuration
//!
//! A graph is described by which row store and which index backend to
//! build, plus session limits. Configuration can be written in YAML:
//!
//! ```yaml
//! store:
//!   type: rocks
//!   path: ./data/graph
//! index:
//!   type: queued
//!   refresh_delay_ms: 50
//! wait_timeout_ms: 5000
//! max_sessions: 64
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Row store to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Rocks { path: PathBuf },
}

/// Index backend to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexConfig {
    #[default]
    Memory,
    Queued {
        #[serde(default)]
        refresh_delay_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GraphConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub index: IndexConfig,

    /// Upper bound on a single generation wait; unset waits forever
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,

    /// Maximum number of concurrently open sessions
    #[serde(default)]
    pub max_sessions: Option<usize>,
}

impl GraphConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let StoreConfig::Rocks { path } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("rocks store path must not be empty".into()));
            }
        }
        if self.max_sessions == Some(0) {
            return Err(ConfigError::Invalid("max_sessions must be positive".into()));
        }
        Ok(())
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = GraphConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, GraphConfig::default());
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.wait_timeout(), None);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
store:
  type: rocks
  path: /tmp/graph
index:
  type: queued
  refresh_delay_ms: 25
wait_timeout_ms: 1000
max_sessions: 4
"#;
        let config = GraphConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Rocks {
                path: PathBuf::from("/tmp/graph")
            }
        );
        assert_eq!(config.index, IndexConfig::Queued { refresh_delay_ms: 25 });
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(1000)));
        assert_eq!(config.max_sessions, Some(4));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            GraphConfig::from_yaml_str("max_sessions: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GraphConfig::from_yaml_str("store: {type: nowhere}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = GraphConfig {
            index: IndexConfig::Queued { refresh_delay_ms: 5 },
            ..Default::default()
        };
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(GraphConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            GraphConfig::from_yaml_file(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
