//! # Heron Middleware
//!
//! Middleware chain, resource hooks and the pipeline executor for the Heron
//! framework.
//!
//! ## Execution order
//!
//! ```text
//! Request → request phase → routing → resource phase → before-hooks → responder
//!                                                                        ↓
//! Response ← response phase (reverse order, always) ← after-hooks ←──────┘
//! ```
//!
//! Any stage can end forward processing by returning a
//! [`Signal`](heron_core::Signal) through its [`StageResult`](heron_core::StageResult).
//! The signal is applied to the response and the response phase still runs
//! over every middleware, including those whose earlier phases never ran.
//!
//! | Raised in          | Skipped                                                    |
//! |--------------------|------------------------------------------------------------|
//! | request phase      | rest of request phase, resource phase, hooks, responder    |
//! | resource phase     | rest of resource phase, hooks, responder                   |
//! | before-hook        | remaining before-hooks, responder, all after-hooks         |
//! | responder          | all after-hooks                                            |
//! | after-hook         | remaining after-hooks                                      |
//!
//! ## Dual execution
//!
//! Closure-built stages ([`FnMiddleware`], [`Before`], [`After`],
//! [`FnResource`]) can carry a sync and an async form. The request's
//! [`ExecutionModel`](heron_core::ExecutionModel) picks which one runs;
//! ordering and short-circuit behavior are identical in both.

#![doc(html_root_url = "https://docs.rs/heron-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod callable;
pub mod chain;
pub mod hooks;
pub mod middleware;
pub mod pipeline;
pub mod resource;
pub mod router;

// Re-export main types at crate root
pub use callable::{ready, BoxFuture};
pub use chain::{BoxedMiddleware, IntoMiddlewares, MiddlewareChain};
pub use hooks::{After, AfterHook, Before, BeforeHook, HookChain, HookInfo, HookPhase};
pub use middleware::{FnMiddleware, Middleware, Phases};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineState};
pub use resource::{FnResource, Resource, ResourceRoute};
pub use router::{NoRoutes, Resolution, Router, SingleRoute};
