//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or filter directive could not be parsed.
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// The global subscriber could not be installed, usually because one is
    /// already set.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}
