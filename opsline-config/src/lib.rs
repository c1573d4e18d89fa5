//! Configuration for Opsline services
//!
//! Settings are layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. A TOML or JSON file named by `OPSLINE_CONFIG`
//! 3. A `.env` file in the working directory
//! 4. `OPSLINE_*` environment variables, `__` separating sections
//!
//! ```bash
//! OPSLINE_ENVIRONMENT=production
//! OPSLINE_QUEUE__TOKEN=qstash_token
//! OPSLINE_QUEUE__CURRENT_SIGNING_KEY=sig_current
//! OPSLINE_QUEUE__NEXT_SIGNING_KEY=sig_next
//! OPSLINE_WEBHOOK__TIMEOUT_SECS=10
//! OPSLINE_LIFECYCLE__TABLE_PATH=/etc/opsline/tables.toml
//! ```
//!
//! ```rust,no_run
//! use opsline_config::OpslineConfig;
//!
//! let config = OpslineConfig::load()?;
//! config.validate()?;
//! let table = config.transition_table()?;
//! # Ok::<(), opsline_config::ConfigError>(())
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{CONFIG_PATH_VAR, ENV_PREFIX, Environment, LifecycleConfig, OpslineConfig};

// Re-export the section types so callers need only this crate
pub use opsline_webhooks::{QueueConfig, WebhookConfig};
