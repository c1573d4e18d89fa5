//! Opsline Logging
//!
//! Installs the process-wide `tracing` subscriber used by every Opsline
//! crate. Library crates only emit events through the `tracing` macros;
//! binaries and test harnesses call [`init`] once at startup.
//!
//! # Environment Variables
//!
//! - `OPSLINE_DEBUG=1` - Force debug level
//! - `OPSLINE_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `OPSLINE_LOG_FORMAT=json|pretty|compact` - Set output format
//! - `OPSLINE_LOG_COLOR=1|0` - Enable/disable ANSI colors
//!
//! `RUST_LOG`, when present, takes precedence over `OPSLINE_LOG_LEVEL`.
//!
//! # Usage
//!
//! ```rust
//! opsline_log::init();
//! tracing::info!(tenant_id = "t-1", "service started");
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level emitted by the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable output
    Pretty,
    /// Single-line human readable output
    Compact,
    /// One JSON object per line (default)
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether ANSI colors are enabled (ignored for JSON)
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            color: false,
        }
    }
}

impl LogConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build the configuration from an explicit set of variables.
    ///
    /// Unknown or malformed values fall back to the defaults.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut debug = false;
        let mut level = None;
        let mut format = None;
        let mut color = None;

        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                "OPSLINE_DEBUG" => debug = is_truthy(value),
                "OPSLINE_LOG_LEVEL" => level = value.parse::<Level>().ok(),
                "OPSLINE_LOG_FORMAT" => format = value.parse::<Format>().ok(),
                "OPSLINE_LOG_COLOR" => color = Some(is_truthy(value)),
                _ => {}
            }
        }

        let mut level = level.unwrap_or(Level::Info);
        if debug && level > Level::Debug {
            level = Level::Debug;
        }

        Self {
            level,
            format: format.unwrap_or(Format::Json),
            color: color.unwrap_or(false),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

// ============================================================================
// Subscriber installation
// ============================================================================

/// Install the global subscriber configured from the environment.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init() -> bool {
    try_init(&LogConfig::from_env())
}

/// Install the global subscriber with an explicit configuration.
///
/// Returns `false` when a global subscriber was already installed.
pub fn try_init(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        Format::Json => registry
            .with(tracing_fmt::layer().json().with_target(true))
            .try_init(),
        Format::Pretty => registry
            .with(tracing_fmt::layer().pretty().with_ansi(config.color))
            .try_init(),
        Format::Compact => registry
            .with(tracing_fmt::layer().compact().with_ansi(config.color))
            .try_init(),
    };

    installed.is_ok()
}
