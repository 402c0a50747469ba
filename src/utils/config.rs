use crate::api::selection::TieBreak;
use crate::core::{DEFAULT_BUDGET_MS, MAX_BUDGET_MS};
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Acquisition coordinator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Time allowed for a live fix before falling back to cached fixes (milliseconds)
    pub budget_ms: u64,
    /// Winner among cached fixes with equal timestamps
    pub tie_break: TieBreak,
    /// Log level used when the crate installs its own subscriber
    pub log_level: LogLevel,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            budget_ms: DEFAULT_BUDGET_MS,
            tie_break: TieBreak::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Configuration file I/O error
    #[error("failed to access config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// JSON serialization/deserialization error
    #[error("failed to parse config: {source}")]
    Serialization {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
}

impl AcquisitionConfig {
    /// Acquisition budget as a duration
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    /// Set the budget, rounding up to whole milliseconds
    pub fn with_budget(mut self, budget: Duration) -> Self {
        let millis = budget.as_millis();
        let partial = u128::from(budget.subsec_nanos() % 1_000_000 != 0);
        self.budget_ms = u64::try_from(millis + partial).unwrap_or(u64::MAX);
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget_ms == 0 || self.budget_ms > MAX_BUDGET_MS {
            return Err(ConfigError::InvalidParameter {
                parameter: "budget_ms".to_string(),
                value: self.budget_ms.to_string(),
                reason: format!("must be between 1 and {}", MAX_BUDGET_MS),
            });
        }
        Ok(())
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: AcquisitionConfig = serde_json::from_str(content)
            .map_err(|source| ConfigError::Serialization { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AcquisitionConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Serialization {
                path: Some(path.to_path_buf()),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate and write configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self).map_err(|source| {
            ConfigError::Serialization {
                path: Some(path.to_path_buf()),
                source,
            }
        })?;

        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
