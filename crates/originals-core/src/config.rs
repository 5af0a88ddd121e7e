//! Environment configuration helpers.
//!
//! Every `from_env()` constructor in the workspace reads its variables
//! through these helpers: an unset variable yields the default, a set but
//! unparsable variable is an error naming the variable.

use std::str::FromStr;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
    #[error("{0} environment variable is required")]
    Missing(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(var: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse `var` with `FromStr`, or return `default` when unset.
pub fn env_parse<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(var, &raw, e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Parse a boolean flag: `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn env_bool(var: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::invalid(var, &raw, "expected a boolean")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
