//! Configuration management for the todos application.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is read first when present.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Delay before the list is reordered (milliseconds)
pub const REORDER_DELAY_VAR: &str = "TODOS_REORDER_DELAY_MS";
/// Time allowed for a pending reorder on exit (seconds)
pub const SHUTDOWN_TIMEOUT_VAR: &str = "TODOS_SHUTDOWN_TIMEOUT_SECS";
/// Whether to start from the sample list (`true`/`false`)
pub const SEED_VAR: &str = "TODOS_SEED";

/// Errors from loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value {value:?} for {var}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoConfig {
    /// How long after the last checkbox tap completed items sink (default: 1s)
    pub reorder_delay: Duration,
    /// Graceful shutdown timeout (default: 5s)
    pub shutdown_timeout: Duration,
    /// Start from the sample list instead of an empty one (default: true)
    pub seed: bool,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            reorder_delay: Duration::from_millis(1000),
            shutdown_timeout: Duration::from_secs(5),
            seed: true,
        }
    }
}

impl TodoConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to a value that
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            reorder_delay: parse::<u64>(&lookup, REORDER_DELAY_VAR)?
                .map_or(defaults.reorder_delay, Duration::from_millis),
            shutdown_timeout: parse::<u64>(&lookup, SHUTDOWN_TIMEOUT_VAR)?
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
            seed: parse::<bool>(&lookup, SEED_VAR)?.unwrap_or(defaults.seed),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(TodoConfig::from_lookup(lookup(&[])), Ok(TodoConfig::default()));
    }

    #[test]
    fn test_overrides() {
        let config = TodoConfig::from_lookup(lookup(&[
            (REORDER_DELAY_VAR, "250"),
            (SHUTDOWN_TIMEOUT_VAR, " 2 "),
            (SEED_VAR, "false"),
        ]));

        assert_eq!(
            config,
            Ok(TodoConfig {
                reorder_delay: Duration::from_millis(250),
                shutdown_timeout: Duration::from_secs(2),
                seed: false,
            })
        );
    }

    #[test]
    fn test_invalid_value() {
        let config = TodoConfig::from_lookup(lookup(&[(REORDER_DELAY_VAR, "soon")]));

        assert_eq!(
            config,
            Err(ConfigError::Invalid {
                var: REORDER_DELAY_VAR,
                value: "soon".to_string(),
            })
        );
    }
}
