//! Engine configuration.
//!
//! Loads settings from a TOML file or falls back to defaults. Every field
//! has a serde default so partial files are fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::tier::TierPolicy;
use crate::votes::ModelSchema;

/// Config file looked up when none is given
pub const DEFAULT_CONFIG_PATH: &str = "glimpse.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSONL history file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("glimpse_history.jsonl")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "glimpse_engine=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Which upstream shape the prediction service returns
    #[serde(default)]
    pub policy: TierPolicy,

    #[serde(default)]
    pub schema: ModelSchema,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    pub fn from_toml(raw: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            toml::from_str(raw).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        info!(
            "Loaded config from {} (policy {}, schema {})",
            path.display(),
            config.policy,
            config.schema.version
        );
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.schema.validate()?;
        if self.store.path.as_os_str().is_empty() {
            return Err(EngineError::Config("store.path is empty".to_string()));
        }
        Ok(())
    }
}
