use crate::sim::SimInput;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file not found, looked at './{0}' and '../../{0}'")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// 0 means no cap.
    pub max_threads: usize,
    pub reserve_cores: usize,
    pub stack_size_mb: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            max_threads: 0,
            reserve_cores: 1,
            stack_size_mb: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scenario: SimInput,
    pub worker: WorkerConfig,
}

impl Config {
    /// Reads `path`, falling back to `../../path` for runs from `target/<profile>/`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let resolved = if Path::new(path).exists() {
            path.to_string()
        } else {
            let parent = format!("../../{}", path);
            if !Path::new(&parent).exists() {
                return Err(ConfigError::NotFound(path.to_string()));
            }
            info!("Config found in parent directory: {}", parent);
            parent
        };

        let contents = fs::read_to_string(&resolved).map_err(|source| ConfigError::Io {
            path: resolved.clone(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::BaseStrategy;

    #[test]
    fn empty_object_uses_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.scenario.pulls_per_version, 60.0);
        assert_eq!(config.scenario.trials, 5000.0);
        assert_eq!(config.worker.reserve_cores, 1);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let json = r#"{
            "scenario": { "currentPulls": 150, "strategyId": "S2", "seed": "abc" },
            "worker": { "max_threads": 2 }
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.scenario.current_pulls, 150.0);
        assert_eq!(config.scenario.strategy_id, BaseStrategy::S2);
        assert_eq!(config.scenario.seed.as_deref(), Some("abc"));
        assert_eq!(config.scenario.version_count, 6.0);
        assert_eq!(config.worker.max_threads, 2);
        assert_eq!(config.worker.stack_size_mb, 4);
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = Config::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Config::load("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn bundled_config_parses() {
        let config = Config::load("data/config.json").unwrap();
        assert!(config.scenario.trial_count() >= 1);
    }
}
