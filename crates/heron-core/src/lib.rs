//! # Heron Core
//!
//! Core types for the Heron request pipeline.
//!
//! This crate provides the values every pipeline stage works with:
//!
//! - [`Status`] - Normalized `"<code> <reason>"` status line
//! - [`Signal`] - Immutable short-circuit carrying a decided response
//! - [`ResponseState`] - Per-request response accumulator
//! - [`Request`] and [`RequestContext`] - The incoming request and its state
//! - [`Params`] - Route parameters
//! - [`Interrupt`] and [`StageResult`] - The outcome of a stage
//! - [`HeronError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod params;
mod request;
mod response;
mod signal;
mod status;

pub use context::{ExecutionModel, RequestContext, RequestId};
pub use error::{HeronError, HeronResult, Interrupt, StageResult};
pub use params::Params;
pub use request::{HttpRequest, Request};
pub use response::{HttpResponse, ResponseState};
pub use signal::{Signal, SignalBody};
pub use status::Status;
