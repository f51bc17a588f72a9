//! Test error types.

use heron_core::HeronError;
use thiserror::Error;

/// Errors that can occur while simulating requests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The simulated request could not be built.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// The client runtime could not be created.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// The pipeline returned a fault that no stage handled.
    #[error("Unhandled fault: {0}")]
    Fault(#[from] HeronError),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
