//! The pipeline executor.
//!
//! Every request walks the same state machine:
//!
//! ```text
//! REQUEST_PHASE → RESOURCE_PHASE → BEFORE_HOOKS → RESPONDER → AFTER_HOOKS
//!                                                                  ↓
//!                                          DONE ← RESPONSE_PHASE ←─┘
//! ```
//!
//! A short-circuit [`Signal`] raised in any state before `RESPONSE_PHASE` is
//! applied to the response and forces a jump to `RESPONSE_PHASE`. A fault does
//! the same after being recorded in the request context. `RESPONSE_PHASE` is
//! never skipped and `DONE` is reached exactly once per request.
//!
//! The executor is written once against futures; the blocking and cooperative
//! execution models drive the same code.

use crate::chain::{IntoMiddlewares, MiddlewareChain};
use crate::resource::ResourceRoute;
use crate::router::{Resolution, Router};
use heron_core::{
    HeronResult, Interrupt, Params, Request, ResponseState, Signal, StageResult, Status,
};
use http::StatusCode;
use std::sync::Arc;
use tracing::Instrument;

/// States of the per-request state machine, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PipelineState {
    /// Request-phase middleware, before routing.
    RequestPhase = 1,
    /// Routing, then resource-phase middleware.
    ResourcePhase = 2,
    /// Before-hooks of the resolved resource method.
    BeforeHooks = 3,
    /// The responder itself.
    Responder = 4,
    /// After-hooks of the resolved resource method.
    AfterHooks = 5,
    /// Response-phase middleware, in reverse order. Always runs.
    ResponsePhase = 6,
    /// Terminal state.
    Done = 7,
}

impl PipelineState {
    /// Returns the state name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestPhase => "request_phase",
            Self::ResourcePhase => "resource_phase",
            Self::BeforeHooks => "before_hooks",
            Self::Responder => "responder",
            Self::AfterHooks => "after_hooks",
            Self::ResponsePhase => "response_phase",
            Self::Done => "done",
        }
    }

    /// Returns the state that follows on normal completion.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::RequestPhase => Self::ResourcePhase,
            Self::ResourcePhase => Self::BeforeHooks,
            Self::BeforeHooks => Self::Responder,
            Self::Responder => Self::AfterHooks,
            Self::AfterHooks => Self::ResponsePhase,
            Self::ResponsePhase | Self::Done => Self::Done,
        }
    }

    /// Returns true for states that a completed response skips.
    #[must_use]
    pub const fn skipped_when_complete(self) -> bool {
        matches!(self, Self::ResourcePhase | Self::BeforeHooks | Self::Responder)
    }

    /// Returns all states in order.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::RequestPhase,
            Self::ResourcePhase,
            Self::BeforeHooks,
            Self::Responder,
            Self::AfterHooks,
            Self::ResponsePhase,
            Self::Done,
        ]
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The request pipeline executor.
///
/// Holds the middleware chain and is shared read-only across requests.
///
/// # Example
///
/// ```
/// use heron_core::{Request, StageResult};
/// use heron_middleware::{FnMiddleware, FnResource, Pipeline, ResourceRoute, SingleRoute};
/// use http::{Method, Uri};
///
/// let pipeline = Pipeline::builder()
///     .middleware(FnMiddleware::new("tag").on_response(|_req, resp, _res, _ok| -> StageResult {
///         resp.set_header("x-tag", "1")?;
///         Ok(())
///     }))
///     .build();
///
/// let router = SingleRoute::new(ResourceRoute::new(
///     FnResource::new("hello").on(Method::GET, |_req, resp, _params| {
///         resp.set_text("hello");
///         Ok(())
///     }),
/// ));
///
/// let mut req = Request::new(Method::GET, Uri::from_static("/"));
/// let resp = tokio_test::block_on(pipeline.process(&mut req, &router)).unwrap();
/// assert_eq!(resp.text(), "hello");
/// assert_eq!(resp.header("x-tag"), Some("1"));
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    chain: MiddlewareChain,
    fault_status: Status,
}

impl Pipeline {
    /// Creates a pipeline over an existing chain.
    #[must_use]
    pub fn new(chain: MiddlewareChain) -> Self {
        Self {
            chain,
            fault_status: Status::from(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Returns the middleware chain.
    #[must_use]
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Returns the chain for setup-time registration.
    pub fn chain_mut(&mut self) -> &mut MiddlewareChain {
        &mut self.chain
    }

    /// Returns the status written when a fault is recorded.
    #[must_use]
    pub fn fault_status(&self) -> &Status {
        &self.fault_status
    }

    /// Sets the status written when a fault is recorded.
    pub fn set_fault_status(&mut self, status: impl Into<Status>) {
        self.fault_status = status.into();
    }

    /// Processes one request.
    ///
    /// Returns the final response, or the fault that no response-phase stage
    /// handled. A fault raised inside the response phase is returned at once.
    pub async fn process(
        &self,
        req: &mut Request,
        router: &dyn Router,
    ) -> HeronResult<ResponseState> {
        let span = tracing::info_span!(
            "pipeline",
            request_id = %req.context().request_id(),
            method = %req.method(),
            path = %req.path(),
            model = %req.context().execution_model(),
        );
        self.run(req, router).instrument(span).await
    }

    async fn run(&self, req: &mut Request, router: &dyn Router) -> HeronResult<ResponseState> {
        let mut resp = ResponseState::new();
        let mut route: Option<Arc<ResourceRoute>> = None;
        let mut params = Params::new();
        let mut succeeded = false;
        let mut state = PipelineState::RequestPhase;

        while state != PipelineState::Done {
            tracing::debug!(stage = state.name(), "entering stage");
            state = match state {
                PipelineState::RequestPhase => {
                    let outcome = self.chain.run_request(req, &mut resp).await;
                    self.settle(state, outcome, req, &mut resp)
                }
                PipelineState::ResourcePhase => match router.resolve(req) {
                    Resolution::NotFound => {
                        let outcome = Err(Signal::new(StatusCode::NOT_FOUND).clear_body().into());
                        self.settle(state, outcome, req, &mut resp)
                    }
                    Resolution::Found {
                        route: found,
                        params: captured,
                    } => {
                        route = Some(Arc::clone(&found));
                        let outcome = if found.serves(req.method()) {
                            params = captured;
                            self.chain
                                .run_resource(req, &mut resp, found.resource(), &mut params)
                                .await
                        } else {
                            method_not_allowed(&found)
                        };
                        self.settle(state, outcome, req, &mut resp)
                    }
                },
                PipelineState::BeforeHooks => {
                    let outcome = match route.as_deref() {
                        Some(found) => found.run_before(req, &mut resp, &mut params).await,
                        None => Err(unresolved(state)),
                    };
                    self.settle(state, outcome, req, &mut resp)
                }
                PipelineState::Responder => {
                    let outcome = match route.as_deref() {
                        Some(found) => found.respond(req, &mut resp, &params).await,
                        None => Err(unresolved(state)),
                    };
                    self.settle(state, outcome, req, &mut resp)
                }
                PipelineState::AfterHooks => {
                    let outcome = match route.as_deref() {
                        Some(found) => found.run_after(req, &mut resp).await,
                        None => Err(unresolved(state)),
                    };
                    succeeded = outcome.is_ok();
                    self.settle(state, outcome, req, &mut resp)
                }
                PipelineState::ResponsePhase => {
                    let resource = route.as_deref().map(ResourceRoute::resource);
                    if let Err(err) = self
                        .chain
                        .run_response(req, &mut resp, resource, succeeded)
                        .await
                    {
                        tracing::error!(error = %err, "fault in response phase");
                        return Err(err);
                    }
                    PipelineState::Done
                }
                PipelineState::Done => PipelineState::Done,
            };
        }

        if let Some(fault) = req.context_mut().take_fault() {
            tracing::warn!(error = %fault, "unhandled fault");
            return Err(fault);
        }

        tracing::info!(
            status = %resp.status(),
            succeeded,
            duration_ms = req.context().elapsed().as_secs_f64() * 1000.0,
            "request completed"
        );
        Ok(resp)
    }

    /// Turns a stage outcome into the next state.
    fn settle(
        &self,
        state: PipelineState,
        outcome: StageResult,
        req: &mut Request,
        resp: &mut ResponseState,
    ) -> PipelineState {
        match outcome {
            Ok(()) => {
                let next = state.next();
                if resp.is_complete() && next.skipped_when_complete() {
                    tracing::debug!(stage = state.name(), "response marked complete");
                    PipelineState::ResponsePhase
                } else {
                    next
                }
            }
            Err(Interrupt::Signal(signal)) => {
                tracing::info!(
                    stage = state.name(),
                    status = %signal.status(),
                    "short-circuit"
                );
                signal.apply(resp);
                PipelineState::ResponsePhase
            }
            Err(Interrupt::Fault(err)) => {
                tracing::warn!(stage = state.name(), error = %err, "stage fault");
                resp.set_status(self.fault_status.clone());
                resp.clear_body();
                req.context_mut().record_fault(err);
                PipelineState::ResponsePhase
            }
        }
    }
}

fn method_not_allowed(route: &ResourceRoute) -> StageResult {
    let signal = Signal::new(StatusCode::METHOD_NOT_ALLOWED)
        .header(http::header::ALLOW, route.allow_header())?
        .clear_body();
    Err(signal.into())
}

fn unresolved(state: PipelineState) -> Interrupt {
    heron_core::HeronError::internal(format!("{state} reached without a resolved resource")).into()
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(MiddlewareChain::new())
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    chain: MiddlewareChain,
    fault_status: Option<Status>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder with no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one middleware or a collection of middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: impl IntoMiddlewares) -> Self {
        self.chain.add(middleware);
        self
    }

    /// Sets the status written onto the response when a fault is recorded.
    #[must_use]
    pub fn fault_status(mut self, status: impl Into<Status>) -> Self {
        self.fault_status = Some(status.into());
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let mut pipeline = Pipeline::new(self.chain);
        if let Some(status) = self.fault_status {
            pipeline.fault_status = status;
        }
        pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use crate::resource::FnResource;
    use crate::router::{NoRoutes, SingleRoute};
    use heron_core::HeronError;
    use http::{Method, Uri};

    fn get() -> Request {
        Request::new(Method::GET, Uri::from_static("/"))
    }

    #[test]
    fn test_state_ordering() {
        let states = PipelineState::all();
        assert!(states.windows(2).all(|w| w[0] < w[1]));
        for pair in states.windows(2) {
            assert_eq!(pair[0].next(), pair[1]);
        }
        assert_eq!(PipelineState::Done.next(), PipelineState::Done);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PipelineState::RequestPhase.name(), "request_phase");
        assert_eq!(PipelineState::BeforeHooks.to_string(), "before_hooks");
        assert_eq!(PipelineState::ResponsePhase.name(), "response_phase");
    }

    #[test]
    fn test_builder_sets_fault_status() {
        let pipeline = Pipeline::builder()
            .fault_status(StatusCode::SERVICE_UNAVAILABLE)
            .build();
        assert_eq!(pipeline.fault_status(), "503 Service Unavailable");
        assert_eq!(
            Pipeline::new(MiddlewareChain::new()).fault_status(),
            "500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_route_miss_is_not_found() {
        let pipeline = Pipeline::builder().build();
        let resp = pipeline.process(&mut get(), &NoRoutes).await.unwrap();
        assert_eq!(resp.status(), "404 Not Found");
        assert_eq!(resp.text(), "");
    }

    #[tokio::test]
    async fn test_unserved_method_is_method_not_allowed() {
        let pipeline = Pipeline::builder()
            .middleware(FnMiddleware::new("resource_probe").on_resource(
                |_req, resp, _res, _params| {
                    resp.set_header("x-resource-phase", "ran")?;
                    Ok(())
                },
            ))
            .build();
        let router = SingleRoute::new(ResourceRoute::new(
            FnResource::new("ro")
                .on(Method::GET, |_req, _resp, _params| Ok(()))
                .on(Method::HEAD, |_req, _resp, _params| Ok(())),
        ));

        let mut req = Request::new(Method::DELETE, Uri::from_static("/"));
        let resp = pipeline.process(&mut req, &router).await.unwrap();

        assert_eq!(resp.status(), "405 Method Not Allowed");
        assert_eq!(resp.header("allow"), Some("GET, HEAD"));
        assert_eq!(resp.header("x-resource-phase"), None);
    }

    #[tokio::test]
    async fn test_unhandled_fault_is_returned_after_response_phase() {
        let pipeline = Pipeline::builder()
            .middleware(FnMiddleware::new("observer").on_response(|req, resp, _res, ok| {
                assert!(!ok);
                assert!(req.context().fault().is_some());
                resp.set_header("x-observed", "1")?;
                Ok(())
            }))
            .build();
        let router = SingleRoute::new(ResourceRoute::new(FnResource::new("boom").on(
            Method::GET,
            |_req, resp, _params| {
                resp.set_text("partial");
                Err(HeronError::stage("boom", "exploded").into())
            },
        )));

        let result = pipeline.process(&mut get(), &router).await;
        assert!(matches!(result, Err(HeronError::Stage { .. })));
    }
}
