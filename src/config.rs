//! Configuration management for ocrmerge.
//!
//! Values are resolved in order: defaults, config file, environment
//! variables, then CLI flags (applied by the caller).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::{DEFAULT_DPI, DEFAULT_LANGUAGE};
use crate::services::ocr::{
    default_concurrency, PipelineOptions, DEFAULT_TASK_TIMEOUT, DEFAULT_THRESHOLD,
};

/// Name `prefer` searches for in the standard config locations.
pub const CONFIG_NAME: &str = "ocrmerge";

pub const ENV_THRESHOLD: &str = "OCRMERGE_THRESHOLD";
pub const ENV_LANGUAGES: &str = "OCRMERGE_LANGUAGES";
pub const ENV_WORKERS: &str = "OCRMERGE_WORKERS";
pub const ENV_TIMEOUT_SECS: &str = "OCRMERGE_TIMEOUT_SECS";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum trimmed characters for a page to skip OCR.
    pub threshold: usize,
    /// OCR languages in preference order (Tesseract codes, e.g. "eng").
    pub languages: Vec<String>,
    /// Maximum concurrent OCR calls.
    pub workers: usize,
    /// Per-page OCR timeout in seconds.
    pub timeout_secs: u64,
    /// Rasterization resolution for OCR.
    pub dpi: u32,
    /// File this config was loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            languages: vec![DEFAULT_LANGUAGE.to_string()],
            workers: default_concurrency(),
            timeout_secs: DEFAULT_TASK_TIMEOUT.as_secs(),
            dpi: DEFAULT_DPI,
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Uses `path` if given, otherwise the first discovered config file,
    /// otherwise defaults. Environment overrides are applied last.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover().await,
        };

        let config = match path {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load_from_path(&path).await?
            }
            None => Self::default(),
        };

        let config = config.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Find a config file in the standard locations using prefer.
    pub async fn discover() -> Option<PathBuf> {
        match prefer::load(CONFIG_NAME).await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(_) => {
                tracing::debug!("No {} config file found, using defaults", CONFIG_NAME);
                None
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Format is chosen by extension: TOML, YAML, or JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parse_err = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err("YAML", e.to_string()))?
            }
            "json" => {
                serde_json::from_str(&contents).map_err(|e| parse_err("JSON", e.to_string()))?
            }
            _ => toml::from_str(&contents).map_err(|e| parse_err("TOML", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply `OCRMERGE_*` overrides using `lookup` to read variables.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_THRESHOLD) {
            self.threshold = parse_number(ENV_THRESHOLD, &value)?;
        }
        if let Some(value) = get(ENV_LANGUAGES) {
            self.languages = split_languages(&value);
        }
        if let Some(value) = get(ENV_WORKERS) {
            self.workers = parse_number(ENV_WORKERS, &value)?;
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_number(ENV_TIMEOUT_SECS, &value)?;
        }

        Ok(self)
    }

    /// Reject values the pipeline can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::Invalid {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.threshold == 0 {
            return invalid("threshold", "must be at least 1");
        }
        if self.workers == 0 {
            return invalid("workers", "must be at least 1");
        }
        if self.timeout_secs == 0 {
            return invalid("timeout_secs", "must be at least 1");
        }
        if self.dpi == 0 {
            return invalid("dpi", "must be at least 1");
        }
        if self.languages.iter().all(|l| l.trim().is_empty()) {
            return invalid("languages", "at least one language is required");
        }
        Ok(())
    }

    /// Options for a `DocumentPipeline`.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            threshold: self.threshold,
            language_hints: self.languages.clone(),
            max_concurrency: self.workers,
            per_task_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("expected a number, got '{}'", value),
    })
}

/// Split a language list like "eng+deu" or "eng, deu".
pub fn split_languages(value: &str) -> Vec<String> {
    value
        .split(['+', ',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
