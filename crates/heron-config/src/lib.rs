//! Typed configuration for Heron services.
//!
//! Configuration is layered (defaults → file → env) and strict: unknown
//! fields fail the load instead of being ignored.
//!
//! # Configuration File Format
//!
//! ```toml
//! service_name = "orders"
//!
//! [pipeline]
//! execution_model = "cooperative"   # or "blocking"
//! fault_status = 500
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"                   # or "pretty"
//! span_events = false
//! include_location = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every value can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `HERON__SERVICE_NAME=orders`
//! - `HERON__PIPELINE__EXECUTION_MODEL=blocking`
//! - `HERON__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HeronConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingConfig, PipelineConfig};
