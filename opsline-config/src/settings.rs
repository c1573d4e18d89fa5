// Opsline service configuration

use crate::env::EnvLoader;
use crate::loader::{ConfigLoader, merge};
use crate::{ConfigError, Result};
use opsline_lifecycle::TransitionTable;
use opsline_webhooks::{QueueConfig, WebhookConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use url::Url;

/// Variable naming an optional configuration file
pub const CONFIG_PATH_VAR: &str = "OPSLINE_CONFIG";

/// Prefix of override variables
pub const ENV_PREFIX: &str = "OPSLINE";

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        })
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::ParseError(format!("unknown environment: {}", other))),
        }
    }
}

/// Transition table settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// TOML or JSON file overlaid on the built-in tables
    pub table_path: Option<PathBuf>,
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpslineConfig {
    pub environment: Environment,
    pub webhook: WebhookConfig,
    pub queue: QueueConfig,
    pub lifecycle: LifecycleConfig,
}

impl OpslineConfig {
    /// Load from defaults, the `OPSLINE_CONFIG` file, `.env` and the environment
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::LoadError(format!(".env: {}", e))),
        }

        let file = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        let config = Self::from_sources(file.as_deref(), std::env::vars())?;
        info!(environment = %config.environment, "configuration loaded");
        Ok(config)
    }

    /// Layer an optional file and explicit variables over the defaults
    pub fn from_sources<I, K, V>(file: Option<&Path>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut tree = serde_json::to_value(Self::default())
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        if let Some(path) = file {
            let overlay = ConfigLoader::auto(path)?.load_file(path)?;
            merge(&mut tree, overlay);
            debug!(path = %path.display(), "applied configuration file");
        }

        let applied = EnvLoader::new(ENV_PREFIX).apply_vars(&mut tree, vars)?;
        debug!(applied, "applied environment overrides");

        serde_json::from_value(tree).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Check the configuration is safe to run with
    pub fn validate(&self) -> Result<()> {
        if self.webhook.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "webhook.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.webhook.max_payload_size == 0 {
            return Err(ConfigError::ValidationError(
                "webhook.max_payload_size must be greater than zero".to_string(),
            ));
        }

        for (name, value) in [
            ("queue.publish_url", &self.queue.publish_url),
            ("queue.destination", &self.queue.destination),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::ValidationError(format!("{}: {}", name, e)))?;
        }

        if self.environment.is_production() && !self.queue.has_signing_keys() {
            return Err(ConfigError::ValidationError(
                "queue signing keys are required in production".to_string(),
            ));
        }

        Ok(())
    }

    /// Built-in transition tables, overlaid with `lifecycle.table_path` if set
    pub fn transition_table(&self) -> Result<TransitionTable> {
        let table = TransitionTable::standard();
        match &self.lifecycle.table_path {
            Some(path) => Ok(table.merge(TransitionTable::load(path)?)),
            None => Ok(table),
        }
    }
}
