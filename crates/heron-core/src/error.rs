//! Error and interruption types for the Heron pipeline.
//!
//! Two kinds of non-local exit exist in a request pipeline:
//!
//! - A [`Signal`] is an intentional short-circuit carrying a fully decided
//!   response. It is never a failure and never escapes the pipeline.
//! - A fault ([`HeronError`]) is a runtime failure inside a stage. The
//!   executor records it, still runs the response phase, and then hands it to
//!   the transport boundary unless a response-phase stage recovered it.
//!
//! Every stage returns a [`StageResult`], so both kinds travel through `?`:
//!
//! ```
//! use heron_core::{Interrupt, ResponseState, Signal, StageResult};
//! use http::StatusCode;
//!
//! fn guard(resp: &mut ResponseState, allowed: bool) -> StageResult {
//!     if !allowed {
//!         return Err(Signal::new(StatusCode::FORBIDDEN).text("denied").into());
//!     }
//!     resp.set_header("x-guard", "passed")?;
//!     Ok(())
//! }
//!
//! let mut resp = ResponseState::new();
//! assert!(guard(&mut resp, true).is_ok());
//! assert!(matches!(guard(&mut resp, false), Err(Interrupt::Signal(_))));
//! ```

use crate::signal::Signal;
use thiserror::Error;

/// Result type alias using [`HeronError`].
pub type HeronResult<T> = Result<T, HeronError>;

/// The outcome of a single pipeline stage.
///
/// `Ok(())` means continue with the next stage; `Err` carries either a
/// short-circuit [`Signal`] or a fault.
pub type StageResult = Result<(), Interrupt>;

/// Standard error type for Heron.
#[derive(Error, Debug)]
pub enum HeronError {
    /// A status code or status line could not be normalized.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// A header name or value was rejected.
    #[error("invalid header: {0}")]
    InvalidHeader(#[from] http::Error),

    /// A route template or resource registration was rejected.
    #[error("invalid route: {message}")]
    InvalidRoute {
        /// Human-readable error message.
        message: String,
    },

    /// A pipeline stage failed.
    #[error("stage '{stage}' failed: {message}")]
    Stage {
        /// Name of the failing stage.
        stage: String,
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The blocking runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HeronError {
    /// Creates an invalid status error.
    #[must_use]
    pub fn invalid_status(value: impl Into<String>) -> Self {
        Self::InvalidStatus(value.into())
    }

    /// Creates an invalid route error.
    #[must_use]
    pub fn invalid_route(message: impl Into<String>) -> Self {
        Self::InvalidRoute {
            message: message.into(),
        }
    }

    /// Creates a stage failure without an underlying cause.
    #[must_use]
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a stage failure wrapping an underlying cause.
    #[must_use]
    pub fn stage_with_source(
        stage: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

impl From<http::header::InvalidHeaderName> for HeronError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.into())
    }
}

impl From<http::header::InvalidHeaderValue> for HeronError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.into())
    }
}

/// A non-local exit from a pipeline stage.
#[derive(Debug)]
pub enum Interrupt {
    /// Abort normal flow and emit the carried response.
    Signal(Box<Signal>),
    /// The stage failed.
    Fault(HeronError),
}

impl Interrupt {
    /// Returns `true` if this is a short-circuit signal.
    #[must_use]
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Signal(_))
    }

    /// Returns `true` if this is a fault.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

impl From<Signal> for Interrupt {
    fn from(signal: Signal) -> Self {
        Self::Signal(Box::new(signal))
    }
}

impl From<HeronError> for Interrupt {
    fn from(err: HeronError) -> Self {
        Self::Fault(err)
    }
}

impl From<anyhow::Error> for Interrupt {
    fn from(err: anyhow::Error) -> Self {
        Self::Fault(HeronError::Internal {
            message: err.to_string(),
            source: Some(err),
        })
    }
}

impl std::fmt::Display for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signal(signal) => write!(f, "short-circuit with status {}", signal.status()),
            Self::Fault(err) => write!(f, "fault: {err}"),
        }
    }
}
