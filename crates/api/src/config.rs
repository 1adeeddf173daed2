//! Service configuration
//!
//! Layered: built-in defaults, then an optional `vitals.toml`, then
//! `VITALS_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use scoring::LoadPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file stem, looked up in the working directory
pub const CONFIG_FILE: &str = "vitals";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "VITALS";

/// Scoring service settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Listen address
    pub bind_addr: String,
    /// Directory holding scaler.bin and risk_classifier.bin
    pub artifact_dir: PathBuf,
    /// Serve with the seed scaler when scaler.bin is unusable
    pub allow_scaler_fallback: bool,
    /// Re-reads when the two artifacts disagree on generation
    pub load_retries: u32,
    pub retry_backoff_ms: u64,
    /// Max tracing level
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            artifact_dir: PathBuf::from("artifacts"),
            allow_scaler_fallback: true,
            load_retries: 3,
            retry_backoff_ms: 100,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load from `vitals.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(CONFIG_FILE).required(false))
    }

    /// Load from an explicit file and the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        Config::builder()
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("artifact_dir", defaults.artifact_dir.to_string_lossy().into_owned())?
            .set_default("allow_scaler_fallback", defaults.allow_scaler_fallback)?
            .set_default("load_retries", u64::from(defaults.load_retries))?
            .set_default("retry_backoff_ms", defaults.retry_backoff_ms)?
            .set_default("log_level", defaults.log_level)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Artifact loading policy
    pub fn load_policy(&self) -> LoadPolicy {
        LoadPolicy {
            allow_scaler_fallback: self.allow_scaler_fallback,
            load_retries: self.load_retries,
            retry_backoff_ms: self.retry_backoff_ms,
        }
    }
}
