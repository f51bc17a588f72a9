//! # Heron
//!
//! A request pipeline for HTTP services. Every request walks the same
//! sequence of stages:
//!
//! ```text
//! request phase → routing → resource phase → before-hooks → responder
//!     → after-hooks → response phase (always, in reverse order)
//! ```
//!
//! Any stage can stop forward processing by returning a [`Signal`], which
//! carries the final status, headers and body. The response phase still runs
//! afterwards and may adjust the result.
//!
//! ## Quick Start
//!
//! ```
//! use heron::prelude::*;
//! use heron::http::{Method, Uri};
//!
//! let mut app = App::new();
//! app.add_route(
//!     "/status",
//!     ResourceRoute::new(FnResource::new("status").on(Method::GET, |_req, resp, _params| {
//!         resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
//!         Err(Signal::new(StatusCode::OK).text("Pass").into())
//!     })),
//! )
//! .unwrap();
//!
//! let mut req = Request::new(Method::GET, Uri::from_static("/status"));
//! let resp = app.handle_blocking(&mut req).unwrap();
//! assert_eq!(resp.status(), "200 OK");
//! assert_eq!(resp.text(), "Pass");
//! ```
//!
//! ## Crates
//!
//! - `heron-core`: signals, the response accumulator, requests and errors
//! - `heron-middleware`: middleware, hooks, resources and the executor
//! - `heron-config`: typed layered configuration
//! - `heron-telemetry`: logging setup

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod routes;
mod runtime;

pub use app::App;
pub use routes::RouteTable;

pub use heron_config::{ConfigError, ConfigLoader, HeronConfig};
pub use heron_core::{
    ExecutionModel, HeronError, HeronResult, HttpRequest, HttpResponse, Interrupt, Params,
    Request, RequestContext, RequestId, ResponseState, Signal, SignalBody, StageResult, Status,
};
pub use heron_middleware::{
    ready, After, AfterHook, Before, BeforeHook, BoxFuture, FnMiddleware, FnResource,
    IntoMiddlewares, Middleware, MiddlewareChain, Phases, Pipeline, PipelineState, Resource,
    ResourceRoute,
};
pub use heron_telemetry::{LogConfig, LogFormat, TelemetryError};

/// Re-export of the `http` crate.
pub use http;

/// Installs the global log subscriber described by `config`.
///
/// # Errors
///
/// Returns `TelemetryError` if the level is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &HeronConfig) -> Result<(), TelemetryError> {
    heron_telemetry::init_logging(&config.log_config())
}

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        After, App, Before, ExecutionModel, FnMiddleware, FnResource, HeronError, Request,
        ResourceRoute, ResponseState, Signal, StageResult,
    };
    pub use http::StatusCode;
}
