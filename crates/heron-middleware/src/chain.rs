//! The ordered middleware chain.
//!
//! Middleware can be registered one at a time, as an ordered collection, or
//! from any iterator. Every form is flattened once, at setup, into a single
//! ordered sequence. The chain is immutable while requests are served.

use crate::middleware::Middleware;
use crate::resource::Resource;
use heron_core::{HeronResult, Interrupt, Params, Request, ResponseState, StageResult};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Anything that can be registered as one or more middleware.
pub trait IntoMiddlewares {
    /// Flattens `self` into middleware in registration order.
    fn into_middlewares(self) -> Vec<BoxedMiddleware>;
}

impl<M: Middleware> IntoMiddlewares for M {
    fn into_middlewares(self) -> Vec<BoxedMiddleware> {
        vec![Arc::new(self)]
    }
}

impl IntoMiddlewares for BoxedMiddleware {
    fn into_middlewares(self) -> Vec<BoxedMiddleware> {
        vec![self]
    }
}

impl<M: Middleware> IntoMiddlewares for Vec<M> {
    fn into_middlewares(self) -> Vec<BoxedMiddleware> {
        self.into_iter()
            .map(|m| Arc::new(m) as BoxedMiddleware)
            .collect()
    }
}

impl IntoMiddlewares for Vec<BoxedMiddleware> {
    fn into_middlewares(self) -> Vec<BoxedMiddleware> {
        self
    }
}

impl<M: Middleware, const N: usize> IntoMiddlewares for [M; N] {
    fn into_middlewares(self) -> Vec<BoxedMiddleware> {
        self.into_iter()
            .map(|m| Arc::new(m) as BoxedMiddleware)
            .collect()
    }
}

impl IntoMiddlewares for MiddlewareChain {
    fn into_middlewares(self) -> Vec<BoxedMiddleware> {
        self.entries
    }
}

/// Middleware in registration order.
///
/// # Example
///
/// ```
/// use heron_middleware::{FnMiddleware, MiddlewareChain};
///
/// let chain: MiddlewareChain = ["a", "b", "c"]
///     .into_iter()
///     .map(|name| FnMiddleware::new(name).on_response(|_, _, _, _| Ok(())))
///     .collect();
///
/// assert_eq!(chain.names(), vec!["a", "b", "c"]);
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    entries: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one middleware or a collection of middleware.
    pub fn add(&mut self, middleware: impl IntoMiddlewares) {
        self.entries.extend(middleware.into_middlewares());
    }

    /// Returns the number of registered middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no middleware is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the middleware names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|m| m.name()).collect()
    }

    /// Runs the request phase in registration order.
    ///
    /// Stops at the first interrupt, or once a stage marks the response
    /// complete.
    pub async fn run_request(&self, req: &mut Request, resp: &mut ResponseState) -> StageResult {
        for mw in self.entries.iter().filter(|m| m.phases().request) {
            tracing::trace!(middleware = mw.name(), "process_request");
            mw.process_request(req, resp).await?;
            if resp.is_complete() {
                break;
            }
        }
        Ok(())
    }

    /// Runs the resource phase in registration order.
    ///
    /// Stops at the first interrupt, or once a stage marks the response
    /// complete.
    pub async fn run_resource(
        &self,
        req: &mut Request,
        resp: &mut ResponseState,
        resource: &dyn Resource,
        params: &mut Params,
    ) -> StageResult {
        for mw in self.entries.iter().filter(|m| m.phases().resource) {
            tracing::trace!(middleware = mw.name(), "process_resource");
            mw.process_resource(req, resp, resource, params).await?;
            if resp.is_complete() {
                break;
            }
        }
        Ok(())
    }

    /// Runs the response phase in reverse registration order.
    ///
    /// Every stage runs. A signal raised here is applied at once, marks any
    /// recorded fault as handled, and the remaining stages still run. A fault
    /// raised here aborts the phase and is returned.
    pub async fn run_response(
        &self,
        req: &mut Request,
        resp: &mut ResponseState,
        resource: Option<&dyn Resource>,
        req_succeeded: bool,
    ) -> HeronResult<()> {
        for mw in self.entries.iter().rev().filter(|m| m.phases().response) {
            tracing::trace!(middleware = mw.name(), "process_response");
            match mw
                .process_response(req, resp, resource, req_succeeded)
                .await
            {
                Ok(()) => {}
                Err(Interrupt::Signal(signal)) => {
                    tracing::debug!(
                        middleware = mw.name(),
                        status = %signal.status(),
                        "response phase short-circuit"
                    );
                    signal.apply(resp);
                    req.context_mut().take_fault();
                }
                Err(Interrupt::Fault(err)) => return Err(err),
            }
        }
        Ok(())
    }
}

impl<T: IntoMiddlewares> FromIterator<T> for MiddlewareChain {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Self::new();
        chain.extend(iter);
        chain
    }
}

impl<T: IntoMiddlewares> Extend<T> for MiddlewareChain {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.add(item);
        }
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
