//! Structured logging for Heron.
//!
//! The pipeline emits `tracing` events at every stage boundary inside a
//! `pipeline` span. This module installs a `tracing-subscriber` registry that
//! renders those events either as JSON lines or in a human-readable format.
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(request_id = "0190...", "request completed");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Level or filter directive (e.g. "info", "heron_middleware=debug").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to emit span open/close events.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Service name attached to the root span.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
            service_name: "heron".to_string(),
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: "heron".to_string(),
        }
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}

/// Initializes the global logging subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidLevel`] if the level does not parse and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let result = match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_thread_ids(config.thread_ids)
                .with_target(config.include_target)
                .with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_span_events(span_events)
                .with_file(config.file_line_info)
                .with_line_number(config.file_line_info)
                .with_thread_ids(config.thread_ids)
                .with_target(config.include_target)
                .with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service.name = %config.service_name,
        format = ?config.format,
        "logging initialized"
    );
    Ok(())
}

/// Creates an env filter from a level or directive string.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidLevel`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidLevel(format!("{filter}: {e}")))
}

/// Field names used by pipeline events.
///
/// Subscribers and log processors can key on these.
pub mod fields {
    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// HTTP method field name.
    pub const METHOD: &str = "method";

    /// Request path field name.
    pub const PATH: &str = "path";

    /// Execution model field name.
    pub const MODEL: &str = "model";

    /// Pipeline stage field name.
    pub const STAGE: &str = "stage";

    /// Final status line field name.
    pub const STATUS: &str = "status";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Error field name.
    pub const ERROR: &str = "error";

    /// Service name field name.
    pub const SERVICE_NAME: &str = "service.name";
}
