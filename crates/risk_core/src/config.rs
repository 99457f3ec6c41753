//! Scorer configuration: TOML file with environment overrides

use crate::pipeline::{ScoreOptions, DEFAULT_THRESHOLD, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "CVD_RISK_CONFIG";

pub const DEFAULT_MODEL_PATH: &str = "models/cvd_gbdt_v1.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Model bundle loaded at startup
    pub model_path: PathBuf,
    /// Default decision threshold
    pub threshold: f64,
    /// Default number of ranked factors
    pub top_n: usize,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            log_level: "info".to_string(),
        }
    }
}

impl ScoringConfig {
    /// Resolve configuration from an explicit file, `CVD_RISK_CONFIG`, or
    /// defaults, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `MODEL_PATH`, `CVD_RISK_THRESHOLD`,
    /// `CVD_RISK_TOP_N` and `CVD_RISK_LOG`; unparsable values are ignored
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("MODEL_PATH") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.model_path = PathBuf::from(trimmed);
            }
        }

        if let Ok(value) = env::var("CVD_RISK_THRESHOLD") {
            match value.trim().parse() {
                Ok(parsed) => self.threshold = parsed,
                Err(_) => warn!(value = %value, "ignoring unparsable CVD_RISK_THRESHOLD"),
            }
        }

        if let Ok(value) = env::var("CVD_RISK_TOP_N") {
            match value.trim().parse() {
                Ok(parsed) => self.top_n = parsed,
                Err(_) => warn!(value = %value, "ignoring unparsable CVD_RISK_TOP_N"),
            }
        }

        if let Ok(value) = env::var("CVD_RISK_LOG") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.log_level = trimmed.to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "threshold must be between 0 and 1 (exclusive), got {}",
                self.threshold
            )));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("model_path is empty".to_string()));
        }
        Ok(())
    }

    pub fn score_options(&self) -> ScoreOptions {
        ScoreOptions {
            threshold: self.threshold,
            top_n: self.top_n,
        }
    }
}
