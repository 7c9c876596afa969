//! Resolution options and the per-compilation session context.

use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CollationId;

/// Dialect used for implicit numeric and temporal coercions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatMode {
    /// SQL standard rules (default).
    #[default]
    Standard,
    /// MySQL-like rules.
    ///
    /// - DISCRETE / DISCRETE yields NUMERIC instead of staying integral
    /// - LOGICAL operands join numeric operands as INTEGER
    MySql,
}

/// Rule for the scale of a NUMERIC division result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivisionScale {
    /// Scale is the larger operand scale.
    Legacy,
    /// Scale is the larger operand scale plus nine digits.
    #[default]
    Modern,
}

/// Options read while resolving expressions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Treat `+` between two character strings as concatenation.
    pub plus_as_concat: bool,
    /// Concatenation treats NULL operands as the empty string.
    pub oracle_style_empty_string: bool,
    pub compat_mode: CompatMode,
    /// Failed casts and function errors produce NULL instead of an error.
    pub return_null_on_function_errors: bool,
    pub numeric_division_scale: DivisionScale,
}

/// Errors loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn with_plus_as_concat(mut self, on: bool) -> Self {
        self.plus_as_concat = on;
        self
    }

    pub fn with_oracle_style_empty_string(mut self, on: bool) -> Self {
        self.oracle_style_empty_string = on;
        self
    }

    pub fn with_compat_mode(mut self, mode: CompatMode) -> Self {
        self.compat_mode = mode;
        self
    }

    pub fn with_return_null_on_function_errors(mut self, on: bool) -> Self {
        self.return_null_on_function_errors = on;
        self
    }

    pub fn with_numeric_division_scale(mut self, rule: DivisionScale) -> Self {
        self.numeric_division_scale = rule;
        self
    }
}

/// Immutable per-compilation context.
///
/// Carries the session values that folding may observe. Each compilation owns
/// its own context, so concurrent compilations never share session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Statement timestamp used for SYS_DATE, SYS_TIME and friends.
    pub now: NaiveDateTime,
    pub user: String,
    pub random_seed: u64,
    /// Collation of literals and untyped parameters.
    pub default_collation: CollationId,
}

impl SessionContext {
    pub fn new(now: NaiveDateTime, user: impl Into<String>) -> Self {
        Self {
            now,
            user: user.into(),
            random_seed: 0,
            default_collation: CollationId::UTF8_BIN,
        }
    }

    pub fn with_default_collation(mut self, collation: CollationId) -> Self {
        self.default_collation = collation;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(Utc::now().naive_utc(), "PUBLIC")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(!config.plus_as_concat);
        assert!(!config.oracle_style_empty_string);
        assert_eq!(config.compat_mode, CompatMode::Standard);
        assert_eq!(config.numeric_division_scale, DivisionScale::Modern);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ResolverConfig::from_json(r#"{ "plus_as_concat": true, "compat_mode": "mysql" }"#)
                .unwrap();
        assert!(config.plus_as_concat);
        assert_eq!(config.compat_mode, CompatMode::MySql);
        assert!(!config.return_null_on_function_errors);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            ResolverConfig::from_json(r#"{ "compat_mode": "oracle" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "numeric_division_scale": "legacy" }}"#).unwrap();

        let config = ResolverConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.numeric_division_scale, DivisionScale::Legacy);
    }

    #[test]
    fn test_builder() {
        let config = ResolverConfig::new()
            .with_oracle_style_empty_string(true)
            .with_return_null_on_function_errors(true);
        assert!(config.oracle_style_empty_string);
        assert!(config.return_null_on_function_errors);
    }
}
