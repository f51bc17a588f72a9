//! Logging setup for Heron services.
//!
//! Heron's pipeline reports progress through `tracing` events. This crate
//! wires those events to an output:
//!
//! - **JSON**: one object per line, for log shippers
//! - **Pretty**: human-readable, for local development
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production().with_service_name("orders"))?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
