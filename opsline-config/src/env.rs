// Environment variable overrides

use crate::{ConfigError, Result};
use serde_json::Value;
use std::env;

/// Maps prefixed environment variables onto a configuration tree.
///
/// `OPSLINE_QUEUE__MAX_RETRIES=5` sets `queue.max_retries`; a double
/// underscore separates nesting levels. Only keys already present in the
/// tree are applied, and values take the type of the value they replace.
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a loader for `<prefix>_*` variables
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply(&self, tree: &mut Value) -> Result<usize> {
        self.apply_vars(tree, env::vars())
    }

    /// Apply overrides from explicit variables; returns how many were applied
    pub fn apply_vars<I, K, V>(&self, tree: &mut Value, vars: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut applied = 0;
        let prefix = format!("{}_", self.prefix);

        for (key, value) in vars {
            let Some(rest) = key.as_ref().strip_prefix(&prefix) else {
                continue;
            };
            let path: Vec<String> = rest.split("__").map(str::to_lowercase).collect();

            let Some(slot) = lookup_mut(tree, &path) else {
                continue;
            };
            *slot = coerce(slot, value.as_ref()).map_err(|e| {
                ConfigError::ParseError(format!("{}: {}", key.as_ref(), e))
            })?;
            applied += 1;
        }

        Ok(applied)
    }
}

fn lookup_mut<'a>(tree: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    path.iter()
        .try_fold(tree, |node, segment| node.as_object_mut()?.get_mut(segment))
        .filter(|slot| !slot.is_object())
}

fn coerce(current: &Value, raw: &str) -> std::result::Result<Value, String> {
    match current {
        Value::Bool(_) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Value::Bool(true)),
            "0" | "false" | "no" => Ok(Value::Bool(false)),
            other => Err(format!("expected a boolean, got '{}'", other)),
        },
        Value::Number(_) => raw
            .trim()
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| format!("expected a number, got '{}'", raw)),
        // Unset optional values become strings; an empty string unsets them
        Value::Null if raw.is_empty() => Ok(Value::Null),
        _ => Ok(Value::String(raw.to_string())),
    }
}
