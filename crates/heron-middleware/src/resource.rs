//! Resources, their responders and per-method hook registration.
//!
//! A [`Resource`] answers requests for the methods it serves. A
//! [`ResourceRoute`] binds a resource to its hooks: hooks attached to one
//! method with [`ResourceRoute::before`] / [`ResourceRoute::after`], and hooks
//! attached to every method with [`ResourceRoute::before_all`] /
//! [`ResourceRoute::after_all`]. Resource-wide before-hooks run ahead of the
//! method's own, and resource-wide after-hooks run after the method's own.
//!
//! Registration is checked eagerly: attaching a hook to a method the resource
//! does not serve is an error.
//!
//! # Example
//!
//! ```
//! use heron_core::{Signal, StageResult};
//! use heron_middleware::hooks::Before;
//! use heron_middleware::resource::{FnResource, ResourceRoute};
//! use http::{Method, StatusCode};
//!
//! let items = FnResource::new("items").on(Method::GET, |_req, resp, params| {
//!     resp.set_text(format!("item {}", params.get("id").unwrap_or("?")));
//!     Ok(())
//! });
//!
//! let route = ResourceRoute::new(items)
//!     .before(
//!         Method::GET,
//!         Before::new(|_req, _resp, _resource, _params| -> StageResult {
//!             Err(Signal::new(StatusCode::OK).text("Pass").into())
//!         }),
//!     )
//!     .unwrap();
//!
//! assert!(route.serves(&Method::GET));
//! assert!(!route.serves(&Method::POST));
//! assert!(ResourceRoute::new(FnResource::new("empty"))
//!     .before(Method::GET, Before::new(|_, _, _, _| Ok(())))
//!     .is_err());
//! # let _ = route;
//! ```

use crate::callable::{ready, AsyncResponderFn, BoxFuture, Forms, Selected, SyncResponderFn};
use crate::hooks::{AfterHook, BeforeHook, HookChain, HookInfo};
use heron_core::{HeronError, HeronResult, Params, Request, ResponseState, StageResult};
use http::Method;
use std::sync::Arc;

/// A routable resource exposing method responders.
pub trait Resource: Send + Sync + 'static {
    /// Returns the resource name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the methods this resource serves, in the order they are
    /// advertised in an `Allow` header.
    fn methods(&self) -> Vec<Method>;

    /// Runs the responder for `method`.
    fn respond<'a>(
        &'a self,
        method: &'a Method,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        params: &'a Params,
    ) -> BoxFuture<'a, StageResult>;
}

/// A resource assembled from responder closures.
pub struct FnResource {
    name: &'static str,
    responders: Vec<(Method, Forms<SyncResponderFn, AsyncResponderFn>)>,
}

impl FnResource {
    /// Creates a resource that serves no methods yet.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            responders: Vec::new(),
        }
    }

    fn forms_mut(&mut self, method: Method) -> &mut Forms<SyncResponderFn, AsyncResponderFn> {
        let index = match self.responders.iter().position(|(m, _)| *m == method) {
            Some(index) => index,
            None => {
                self.responders.push((method, Forms::default()));
                self.responders.len() - 1
            }
        };
        &mut self.responders[index].1
    }

    /// Sets the synchronous responder for `method`.
    #[must_use]
    pub fn on<F>(mut self, method: Method, f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState, &Params) -> StageResult + Send + Sync + 'static,
    {
        self.forms_mut(method).set_sync(Box::new(f));
        self
    }

    /// Sets the asynchronous responder for `method`.
    #[must_use]
    pub fn on_async<F>(mut self, method: Method, f: F) -> Self
    where
        F: for<'a> Fn(
                &'a mut Request,
                &'a mut ResponseState,
                &'a Params,
            ) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        self.forms_mut(method).set_async(Box::new(f));
        self
    }
}

impl Resource for FnResource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn methods(&self) -> Vec<Method> {
        self.responders.iter().map(|(m, _)| m.clone()).collect()
    }

    fn respond<'a>(
        &'a self,
        method: &'a Method,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        params: &'a Params,
    ) -> BoxFuture<'a, StageResult> {
        let model = req.context().execution_model();
        let selected = self
            .responders
            .iter()
            .find(|(m, _)| m == method)
            .and_then(|(_, forms)| forms.select(model));

        match selected {
            Some(Selected::Sync(f)) => ready(f(req, resp, params)),
            Some(Selected::Async(f)) => f(req, resp, params),
            None => {
                let fault = HeronError::stage(self.name, format!("no responder for {method}"));
                ready(Err(fault.into()))
            }
        }
    }
}

impl std::fmt::Debug for FnResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnResource")
            .field("name", &self.name)
            .field("methods", &self.methods())
            .finish()
    }
}

/// A resource together with its hooks.
///
/// Immutable once registered with an application; shared read-only across
/// requests.
pub struct ResourceRoute {
    resource: Arc<dyn Resource>,
    methods: Vec<Method>,
    wide: HookChain,
    per_method: Vec<(Method, HookChain)>,
}

impl ResourceRoute {
    /// Wraps a resource with no hooks.
    pub fn new(resource: impl Resource) -> Self {
        Self::from_arc(Arc::new(resource))
    }

    /// Wraps a shared resource with no hooks.
    pub fn from_arc(resource: Arc<dyn Resource>) -> Self {
        let methods = resource.methods();
        Self {
            resource,
            methods,
            wide: HookChain::new(),
            per_method: Vec::new(),
        }
    }

    fn ensure_served(&self, method: &Method) -> HeronResult<()> {
        if self.serves(method) {
            Ok(())
        } else {
            Err(HeronError::invalid_route(format!(
                "resource '{}' has no responder for {method}",
                self.resource.name()
            )))
        }
    }

    fn chain_mut(&mut self, method: Method) -> &mut HookChain {
        let index = match self.per_method.iter().position(|(m, _)| *m == method) {
            Some(index) => index,
            None => {
                self.per_method.push((method, HookChain::new()));
                self.per_method.len() - 1
            }
        };
        &mut self.per_method[index].1
    }

    /// Attaches a before-hook to one method.
    pub fn before(mut self, method: Method, hook: impl BeforeHook) -> HeronResult<Self> {
        self.ensure_served(&method)?;
        self.chain_mut(method).push_before(hook);
        Ok(self)
    }

    /// Attaches an after-hook to one method.
    pub fn after(mut self, method: Method, hook: impl AfterHook) -> HeronResult<Self> {
        self.ensure_served(&method)?;
        self.chain_mut(method).push_after(hook);
        Ok(self)
    }

    /// Attaches a before-hook to every method of the resource.
    #[must_use]
    pub fn before_all(mut self, hook: impl BeforeHook) -> Self {
        self.wide.push_before(hook);
        self
    }

    /// Attaches an after-hook to every method of the resource.
    #[must_use]
    pub fn after_all(mut self, hook: impl AfterHook) -> Self {
        self.wide.push_after(hook);
        self
    }

    /// Returns the wrapped resource.
    #[must_use]
    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    /// Returns true if the resource serves `method`.
    #[must_use]
    pub fn serves(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Returns the value for an `Allow` header.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn method_chain(&self, method: &Method) -> Option<&HookChain> {
        self.per_method
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, chain)| chain)
    }

    /// Describes the hooks that run for `method`, in execution order.
    #[must_use]
    pub fn hooks_for(&self, method: &Method) -> Vec<HookInfo> {
        HookChain::nested(&self.wide, self.method_chain(method)).describe()
    }

    /// Runs resource-wide then method-specific before-hooks.
    pub async fn run_before(
        &self,
        req: &mut Request,
        resp: &mut ResponseState,
        params: &mut Params,
    ) -> StageResult {
        let resource = self.resource();
        self.wide.run_before(req, resp, resource, params).await?;
        if let Some(chain) = self.method_chain(req.method()) {
            chain.run_before(req, resp, resource, params).await?;
        }
        Ok(())
    }

    /// Runs the responder for the request method.
    pub async fn respond(
        &self,
        req: &mut Request,
        resp: &mut ResponseState,
        params: &Params,
    ) -> StageResult {
        let method = req.method().clone();
        self.resource.respond(&method, req, resp, params).await
    }

    /// Runs method-specific then resource-wide after-hooks.
    pub async fn run_after(&self, req: &mut Request, resp: &mut ResponseState) -> StageResult {
        let resource = self.resource();
        if let Some(chain) = self.method_chain(req.method()) {
            chain.run_after(req, resp, resource).await?;
        }
        self.wide.run_after(req, resp, resource).await
    }
}

impl std::fmt::Debug for ResourceRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRoute")
            .field("resource", &self.resource.name())
            .field("methods", &self.methods)
            .field("wide", &self.wide)
            .field("per_method", &self.per_method)
            .finish()
    }
}
