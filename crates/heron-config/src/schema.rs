//! Configuration section types.

use heron_core::ExecutionModel;
use heron_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

/// Pipeline executor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Execution model used when the caller does not pick one.
    #[serde(default)]
    pub execution_model: ExecutionModel,

    /// Status written onto the response when a stage fails with an
    /// unrecovered fault.
    #[serde(default = "default_fault_status")]
    pub fault_status: u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            execution_model: ExecutionModel::default(),
            fault_status: default_fault_status(),
        }
    }
}

fn default_fault_status() -> u16 {
    500
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit span open/close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
            include_location: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
