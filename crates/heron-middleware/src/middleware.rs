//! Core middleware trait and types.
//!
//! A middleware contributes up to three stages to every request:
//!
//! - **request phase**: runs in registration order before routing.
//! - **resource phase**: runs in registration order once a resource has been
//!   resolved. Receives the resource and the route params (mutably).
//! - **response phase**: runs in reverse registration order, exactly once per
//!   request, even after a short-circuit or a fault. Receives the resolved
//!   resource (if routing got that far) and whether the request succeeded.
//!
//! All phases default to no-ops, so an implementation only overrides what it
//! needs.
//!
//! # Example
//!
//! ```
//! use heron_core::{Request, ResponseState, StageResult};
//! use heron_middleware::{ready, BoxFuture, Middleware, Resource};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &'static str {
//!         "powered_by"
//!     }
//!
//!     fn process_response<'a>(
//!         &'a self,
//!         _req: &'a mut Request,
//!         resp: &'a mut ResponseState,
//!         _resource: Option<&'a dyn Resource>,
//!         _req_succeeded: bool,
//!     ) -> BoxFuture<'a, StageResult> {
//!         ready(resp.set_header("x-powered-by", "heron").map_err(Into::into))
//!     }
//! }
//! ```

use crate::callable::{
    ready, AsyncRequestFn, AsyncResourceFn, AsyncResponseFn, BoxFuture, Forms, Selected,
    SyncRequestFn, SyncResourceFn, SyncResponseFn,
};
use crate::resource::Resource;
use heron_core::{Params, Request, ResponseState, StageResult};

/// The set of phases a middleware takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phases {
    /// Takes part in the request phase.
    pub request: bool,
    /// Takes part in the resource phase.
    pub resource: bool,
    /// Takes part in the response phase.
    pub response: bool,
}

impl Phases {
    /// Every phase.
    pub const ALL: Self = Self {
        request: true,
        resource: true,
        response: true,
    };

    /// No phase.
    pub const NONE: Self = Self {
        request: false,
        resource: false,
        response: false,
    };
}

impl Default for Phases {
    fn default() -> Self {
        Self::ALL
    }
}

/// A three-phase pipeline middleware.
///
/// Implementations are shared across concurrent requests and must not hold
/// per-request state in `self`; use the request's
/// [`RequestContext`](heron_core::RequestContext) extensions instead.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the phases this middleware takes part in.
    ///
    /// Phases not listed are skipped without invoking the method.
    fn phases(&self) -> Phases {
        Phases::ALL
    }

    /// Runs before routing.
    fn process_request<'a>(
        &'a self,
        _req: &'a mut Request,
        _resp: &'a mut ResponseState,
    ) -> BoxFuture<'a, StageResult> {
        ready(Ok(()))
    }

    /// Runs after routing resolved a resource that serves the request method.
    fn process_resource<'a>(
        &'a self,
        _req: &'a mut Request,
        _resp: &'a mut ResponseState,
        _resource: &'a dyn Resource,
        _params: &'a mut Params,
    ) -> BoxFuture<'a, StageResult> {
        ready(Ok(()))
    }

    /// Runs once the response is about to leave the pipeline.
    ///
    /// `resource` is `None` when the request never reached a resource.
    /// `req_succeeded` is true only when the responder and its after-hooks
    /// completed without a short-circuit or a fault.
    fn process_response<'a>(
        &'a self,
        _req: &'a mut Request,
        _resp: &'a mut ResponseState,
        _resource: Option<&'a dyn Resource>,
        _req_succeeded: bool,
    ) -> BoxFuture<'a, StageResult> {
        ready(Ok(()))
    }
}

/// A middleware assembled from closures.
///
/// Each phase may be given a sync form, an async form or both; phases without
/// any form are not part of the middleware.
///
/// # Example
///
/// ```
/// use heron_middleware::{FnMiddleware, Middleware};
///
/// let timing = FnMiddleware::new("timing")
///     .on_request(|req, _resp| {
///         req.context_mut().set_extension(std::time::Instant::now());
///         Ok(())
///     })
///     .on_response_async(|req, resp, _resource, _ok| {
///         Box::pin(async move {
///             let ms = req.context().elapsed().as_millis().to_string();
///             resp.set_header("x-elapsed-ms", ms)?;
///             Ok(())
///         })
///     });
///
/// assert!(timing.phases().request);
/// assert!(!timing.phases().resource);
/// ```
pub struct FnMiddleware {
    name: &'static str,
    request: Forms<SyncRequestFn, AsyncRequestFn>,
    resource: Forms<SyncResourceFn, AsyncResourceFn>,
    response: Forms<SyncResponseFn, AsyncResponseFn>,
}

impl FnMiddleware {
    /// Creates a middleware with no phases.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            request: Forms::default(),
            resource: Forms::default(),
            response: Forms::default(),
        }
    }

    /// Sets the sync request-phase form.
    #[must_use]
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState) -> StageResult + Send + Sync + 'static,
    {
        self.request.set_sync(Box::new(f));
        self
    }

    /// Sets the async request-phase form.
    #[must_use]
    pub fn on_request_async<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut ResponseState) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        self.request.set_async(Box::new(f));
        self
    }

    /// Sets the sync resource-phase form.
    #[must_use]
    pub fn on_resource<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState, &dyn Resource, &mut Params) -> StageResult
            + Send
            + Sync
            + 'static,
    {
        self.resource.set_sync(Box::new(f));
        self
    }

    /// Sets the async resource-phase form.
    #[must_use]
    pub fn on_resource_async<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(
                &'a mut Request,
                &'a mut ResponseState,
                &'a dyn Resource,
                &'a mut Params,
            ) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        self.resource.set_async(Box::new(f));
        self
    }

    /// Sets the sync response-phase form.
    #[must_use]
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState, Option<&dyn Resource>, bool) -> StageResult
            + Send
            + Sync
            + 'static,
    {
        self.response.set_sync(Box::new(f));
        self
    }

    /// Sets the async response-phase form.
    #[must_use]
    pub fn on_response_async<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(
                &'a mut Request,
                &'a mut ResponseState,
                Option<&'a dyn Resource>,
                bool,
            ) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        self.response.set_async(Box::new(f));
        self
    }
}

impl Middleware for FnMiddleware {
    fn name(&self) -> &'static str {
        self.name
    }

    fn phases(&self) -> Phases {
        Phases {
            request: !self.request.is_empty(),
            resource: !self.resource.is_empty(),
            response: !self.response.is_empty(),
        }
    }

    fn process_request<'a>(
        &'a self,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
    ) -> BoxFuture<'a, StageResult> {
        match self.request.select(req.context().execution_model()) {
            Some(Selected::Sync(f)) => ready(f(req, resp)),
            Some(Selected::Async(f)) => f(req, resp),
            None => ready(Ok(())),
        }
    }

    fn process_resource<'a>(
        &'a self,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        resource: &'a dyn Resource,
        params: &'a mut Params,
    ) -> BoxFuture<'a, StageResult> {
        match self.resource.select(req.context().execution_model()) {
            Some(Selected::Sync(f)) => ready(f(req, resp, resource, params)),
            Some(Selected::Async(f)) => f(req, resp, resource, params),
            None => ready(Ok(())),
        }
    }

    fn process_response<'a>(
        &'a self,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        resource: Option<&'a dyn Resource>,
        req_succeeded: bool,
    ) -> BoxFuture<'a, StageResult> {
        match self.response.select(req.context().execution_model()) {
            Some(Selected::Sync(f)) => ready(f(req, resp, resource, req_succeeded)),
            Some(Selected::Async(f)) => f(req, resp, resource, req_succeeded),
            None => ready(Ok(())),
        }
    }
}

impl std::fmt::Debug for FnMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .field("phases", &self.phases())
            .finish()
    }
}
