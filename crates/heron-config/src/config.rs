//! Main configuration type.

use heron_core::Status;
use heron_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingConfig, PipelineConfig};

/// Complete Heron service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.pipeline.fault_status, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Service name reported in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Pipeline executor settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for HeronConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "heron-service".to_string()
}

impl HeronConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the service name is empty, the
    /// fault status is not a valid error status (400-599), or the log level
    /// does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value("service_name", "must not be empty"));
        }

        let status = self.pipeline.fault_status;
        if Status::from_code(status).is_err() || !(400..=599).contains(&status) {
            return Err(ConfigError::invalid_value(
                "pipeline.fault_status",
                format!("expected an error status between 400 and 599, got {status}"),
            ));
        }

        if self.logging.enabled {
            heron_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// The configured fault status, normalized.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the code is not a valid status.
    pub fn fault_status(&self) -> Result<Status, ConfigError> {
        Status::from_code(self.pipeline.fault_status)
            .map_err(|e| ConfigError::invalid_value("pipeline.fault_status", e.to_string()))
    }

    /// Builds the subscriber configuration for this service.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let base = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            span_events: self.logging.span_events,
            file_line_info: self.logging.include_location,
            service_name: self.service_name.clone(),
            ..base
        }
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug-level logs, blocking execution.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.pipeline.execution_model = heron_core::ExecutionModel::Blocking;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.span_events = true;
        config.logging.include_location = true;
        config
    }

    /// Create a production configuration preset.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}
