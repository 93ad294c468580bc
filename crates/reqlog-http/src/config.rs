//! Logger options and their environment overrides.

use reqlog_telemetry::{LogLevel, TelemetryError};
use thiserror::Error;

/// Application name used when none is configured.
pub const DEFAULT_APP_NAME: &str = "unnamed app";

/// Environment variable overriding [`LoggerOptions::name`].
pub const ENV_NAME: &str = "REQLOG_NAME";
/// Environment variable overriding [`LoggerOptions::log_params`].
pub const ENV_LOG_PARAMS: &str = "REQLOG_LOG_PARAMS";
/// Environment variable overriding [`LoggerOptions::level`].
pub const ENV_LEVEL: &str = "REQLOG_LEVEL";

/// Result alias for option loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading logger options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A boolean flag held something other than a recognised truthy/falsy value.
    #[error("invalid boolean flag")]
    InvalidFlag {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
    /// The level variable did not name a known level.
    #[error("invalid log level")]
    InvalidLevel {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Parse failure.
        #[source]
        source: TelemetryError,
    },
}

/// Options accepted by [`RequestLogger`](crate::RequestLogger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Application name stamped on every record.
    pub name: String,
    /// Whether the pixel route logs its path parameters.
    pub log_params: bool,
    /// Minimum level written by the default sink.
    pub level: LogLevel,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_APP_NAME.to_string(),
            log_params: false,
            level: LogLevel::Info,
        }
    }
}

impl LoggerOptions {
    /// Replace the application name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Toggle pixel parameter logging.
    #[must_use]
    pub const fn with_log_params(mut self, log_params: bool) -> Self {
        self.log_params = log_params;
        self
    }

    /// Replace the minimum level.
    #[must_use]
    pub const fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Defaults overridden by `REQLOG_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a flag or level variable cannot be parsed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `REQLOG_*` keys.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a flag or level value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut options = Self::default();
        if let Some(name) = read(ENV_NAME) {
            options.name = name;
        }
        if let Some(flag) = read(ENV_LOG_PARAMS) {
            options.log_params = parse_flag(ENV_LOG_PARAMS, flag)?;
        }
        if let Some(level) = read(ENV_LEVEL) {
            options.level = level
                .parse()
                .map_err(|source| ConfigError::InvalidLevel {
                    key: ENV_LEVEL,
                    value: level.clone(),
                    source,
                })?;
        }
        Ok(options)
    }
}

fn parse_flag(key: &'static str, value: String) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::error::Error;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() -> anyhow::Result<()> {
        let options = LoggerOptions::from_lookup(lookup(&[]))?;
        assert_eq!(options, LoggerOptions::default());
        assert_eq!(options.name, DEFAULT_APP_NAME);
        assert!(!options.log_params);
        assert_eq!(options.level, LogLevel::Info);
        Ok(())
    }

    #[test]
    fn overrides_are_read_and_trimmed() -> anyhow::Result<()> {
        let options = LoggerOptions::from_lookup(lookup(&[
            (ENV_NAME, " shop "),
            (ENV_LOG_PARAMS, "Yes"),
            (ENV_LEVEL, "debug"),
        ]))?;
        assert_eq!(options.name, "shop");
        assert!(options.log_params);
        assert_eq!(options.level, LogLevel::Debug);
        Ok(())
    }

    #[test]
    fn blank_values_count_as_unset() -> anyhow::Result<()> {
        let options = LoggerOptions::from_lookup(lookup(&[(ENV_NAME, "   ")]))?;
        assert_eq!(options.name, DEFAULT_APP_NAME);
        Ok(())
    }

    #[test]
    fn bad_flag_is_rejected() {
        let err = LoggerOptions::from_lookup(lookup(&[(ENV_LOG_PARAMS, "maybe")]));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidFlag { key: ENV_LOG_PARAMS, ref value }) if value == "maybe"
        ));
    }

    #[test]
    fn bad_level_keeps_parse_error_as_source() {
        let err = LoggerOptions::from_lookup(lookup(&[(ENV_LEVEL, "loud")]));
        let Err(err) = err else {
            panic!("expected level error");
        };
        assert_eq!(err.to_string(), "invalid log level");
        assert!(err.source().is_some());
    }

    #[test]
    fn builders_replace_fields() {
        let options = LoggerOptions::default()
            .with_name("api")
            .with_log_params(true)
            .with_level(LogLevel::Warn);
        assert_eq!(options.name, "api");
        assert!(options.log_params);
        assert_eq!(options.level, LogLevel::Warn);
    }
}
