//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use heron_core::ExecutionModel;
use heron_telemetry::LogFormat;

use crate::{ConfigError, HeronConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use heron_config::ConfigLoader;
///
/// # fn main() -> Result<(), heron_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("heron.toml")?
///     .with_env_prefix("HERON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeronConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeronConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HeronConfig::default();
        self
    }

    /// Start from the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeronConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeronConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is picked by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// contains unknown fields, or has an unsupported extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format ("toml" or
    /// "json").
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [pipeline]
    ///     execution_model = "blocking"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.pipeline.execution_model, heron_core::ExecutionModel::Blocking);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `HERON__PIPELINE__EXECUTION_MODEL=blocking`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> Result<HeronConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: HashMap<String, String> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            self.apply_env_vars(&prefix, vars)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Return the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HeronConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<HeronConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_vars(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            // Shares the prefix but not the separator (e.g. HERONX_...).
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["SERVICE_NAME"] => {
                self.config.service_name = value.to_string();
            }
            ["PIPELINE", "EXECUTION_MODEL"] => {
                self.config.pipeline.execution_model = match value.to_lowercase().as_str() {
                    "blocking" => ExecutionModel::Blocking,
                    "cooperative" => ExecutionModel::Cooperative,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'blocking' or 'cooperative'",
                        ))
                    }
                };
            }
            ["PIPELINE", "FAULT_STATUS"] => {
                self.config.pipeline.fault_status = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                self.config.logging.span_events = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            // Unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
