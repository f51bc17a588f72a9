//! Before and after hooks bound to a resource method.
//!
//! Hooks run immediately around the responder, strictly sequentially and in
//! declaration order. A [`Signal`](heron_core::Signal) from a before-hook
//! skips the remaining before-hooks, the responder and every after-hook. A
//! signal from an after-hook skips only the after-hooks that follow it.
//!
//! # Example
//!
//! ```
//! use heron_core::{Signal, StageResult};
//! use heron_middleware::hooks::{After, Before, HookChain};
//! use http::StatusCode;
//!
//! let mut chain = HookChain::new();
//! chain.push_before(Before::new(|_req, _resp, _resource, _params| -> StageResult {
//!     Err(Signal::new(StatusCode::OK).text("Pass").into())
//! }));
//! chain.push_after(After::new(|_req, resp, _resource| -> StageResult {
//!     resp.set_header("x-after", "ran")?;
//!     Ok(())
//! }));
//!
//! assert_eq!(chain.before_len(), 1);
//! assert_eq!(chain.after_len(), 1);
//! ```

use crate::callable::{
    ready, AsyncAfterFn, AsyncResourceFn, BoxFuture, Forms, Selected, SyncAfterFn, SyncResourceFn,
};
use crate::resource::Resource;
use heron_core::{Params, Request, ResponseState, StageResult};
use std::sync::Arc;

/// A hook that runs before the responder.
///
/// Before-hooks receive the route params mutably.
pub trait BeforeHook: Send + Sync + 'static {
    /// Returns the hook name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runs the hook.
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        resource: &'a dyn Resource,
        params: &'a mut Params,
    ) -> BoxFuture<'a, StageResult>;
}

/// A hook that runs after the responder.
pub trait AfterHook: Send + Sync + 'static {
    /// Returns the hook name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runs the hook.
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        resource: &'a dyn Resource,
    ) -> BoxFuture<'a, StageResult>;
}

/// Whether a hook runs before or after the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Runs ahead of the responder.
    Before,
    /// Runs after the responder.
    After,
}

/// A description of one registered hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInfo {
    /// The hook name.
    pub name: &'static str,
    /// Zero-based position within its phase.
    pub position: usize,
    /// The phase the hook belongs to.
    pub phase: HookPhase,
}

/// A before-hook built from closures.
pub struct Before {
    name: &'static str,
    forms: Forms<SyncResourceFn, AsyncResourceFn>,
}

impl Before {
    /// Creates a hook from a synchronous closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState, &dyn Resource, &mut Params) -> StageResult
            + Send
            + Sync
            + 'static,
    {
        let mut forms: Forms<SyncResourceFn, AsyncResourceFn> = Forms::default();
        forms.set_sync(Box::new(f));
        Self {
            name: std::any::type_name::<F>(),
            forms,
        }
    }

    /// Creates a hook from an asynchronous closure.
    ///
    /// ```
    /// use heron_middleware::hooks::Before;
    ///
    /// let hook = Before::new_async(|_req, resp, _resource, _params| {
    ///     Box::pin(async move {
    ///         resp.set_header("x-checked", "yes")?;
    ///         Ok(())
    ///     })
    /// });
    /// # let _ = hook;
    /// ```
    pub fn new_async<F>(f: F) -> Self
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
        let mut forms: Forms<SyncResourceFn, AsyncResourceFn> = Forms::default();
        forms.set_async(Box::new(f));
        Self {
            name: std::any::type_name::<F>(),
            forms,
        }
    }

    /// Adds a synchronous form.
    #[must_use]
    pub fn with_sync<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState, &dyn Resource, &mut Params) -> StageResult
            + Send
            + Sync
            + 'static,
    {
        self.forms.set_sync(Box::new(f));
        self
    }

    /// Adds an asynchronous form.
    #[must_use]
    pub fn with_async<F>(mut self, f: F) -> Self
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
        self.forms.set_async(Box::new(f));
        self
    }

    /// Sets the name used in logs.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl BeforeHook for Before {
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        resource: &'a dyn Resource,
        params: &'a mut Params,
    ) -> BoxFuture<'a, StageResult> {
        match self.forms.select(req.context().execution_model()) {
            Some(Selected::Sync(f)) => ready(f(req, resp, resource, params)),
            Some(Selected::Async(f)) => f(req, resp, resource, params),
            None => ready(Ok(())),
        }
    }
}

impl std::fmt::Debug for Before {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Before")
            .field("name", &self.name)
            .field("forms", &self.forms)
            .finish()
    }
}

/// An after-hook built from closures.
pub struct After {
    name: &'static str,
    forms: Forms<SyncAfterFn, AsyncAfterFn>,
}

impl After {
    /// Creates a hook from a synchronous closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState, &dyn Resource) -> StageResult
            + Send
            + Sync
            + 'static,
    {
        let mut forms: Forms<SyncAfterFn, AsyncAfterFn> = Forms::default();
        forms.set_sync(Box::new(f));
        Self {
            name: std::any::type_name::<F>(),
            forms,
        }
    }

    /// Creates a hook from an asynchronous closure.
    pub fn new_async<F>(f: F) -> Self
    where
        F: for<'a> Fn(
                &'a mut Request,
                &'a mut ResponseState,
                &'a dyn Resource,
            ) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        let mut forms: Forms<SyncAfterFn, AsyncAfterFn> = Forms::default();
        forms.set_async(Box::new(f));
        Self {
            name: std::any::type_name::<F>(),
            forms,
        }
    }

    /// Adds a synchronous form.
    #[must_use]
    pub fn with_sync<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &mut ResponseState, &dyn Resource) -> StageResult
            + Send
            + Sync
            + 'static,
    {
        self.forms.set_sync(Box::new(f));
        self
    }

    /// Adds an asynchronous form.
    #[must_use]
    pub fn with_async<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(
                &'a mut Request,
                &'a mut ResponseState,
                &'a dyn Resource,
            ) -> BoxFuture<'a, StageResult>
            + Send
            + Sync
            + 'static,
    {
        self.forms.set_async(Box::new(f));
        self
    }

    /// Sets the name used in logs.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl AfterHook for After {
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        resp: &'a mut ResponseState,
        resource: &'a dyn Resource,
    ) -> BoxFuture<'a, StageResult> {
        match self.forms.select(req.context().execution_model()) {
            Some(Selected::Sync(f)) => ready(f(req, resp, resource)),
            Some(Selected::Async(f)) => f(req, resp, resource),
            None => ready(Ok(())),
        }
    }
}

impl std::fmt::Debug for After {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("After")
            .field("name", &self.name)
            .field("forms", &self.forms)
            .finish()
    }
}

/// Ordered before- and after-hooks for one resource method.
///
/// Built at registration and shared read-only across requests afterwards.
#[derive(Clone, Default)]
pub struct HookChain {
    before: Vec<Arc<dyn BeforeHook>>,
    after: Vec<Arc<dyn AfterHook>>,
}

impl HookChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a before-hook.
    pub fn push_before(&mut self, hook: impl BeforeHook) {
        self.before.push(Arc::new(hook));
    }

    /// Appends an after-hook.
    pub fn push_after(&mut self, hook: impl AfterHook) {
        self.after.push(Arc::new(hook));
    }

    /// Returns the number of before-hooks.
    #[must_use]
    pub fn before_len(&self) -> usize {
        self.before.len()
    }

    /// Returns the number of after-hooks.
    #[must_use]
    pub fn after_len(&self) -> usize {
        self.after.len()
    }

    /// Returns true if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Combines an outer and an inner chain: outer before-hooks run first and
    /// outer after-hooks run last.
    #[must_use]
    pub fn nested(outer: &Self, inner: Option<&Self>) -> Self {
        let mut combined = outer.clone();
        if let Some(inner) = inner {
            combined.before.extend(inner.before.iter().cloned());
            combined.after.splice(0..0, inner.after.iter().cloned());
        }
        combined
    }

    /// Describes every hook in execution order, before-hooks first.
    #[must_use]
    pub fn describe(&self) -> Vec<HookInfo> {
        let before = self.before.iter().enumerate().map(|(position, hook)| HookInfo {
            name: hook.name(),
            position,
            phase: HookPhase::Before,
        });
        let after = self.after.iter().enumerate().map(|(position, hook)| HookInfo {
            name: hook.name(),
            position,
            phase: HookPhase::After,
        });
        before.chain(after).collect()
    }

    /// Runs the before-hooks in declaration order, stopping at the first
    /// interrupt.
    pub async fn run_before(
        &self,
        req: &mut Request,
        resp: &mut ResponseState,
        resource: &dyn Resource,
        params: &mut Params,
    ) -> StageResult {
        for hook in &self.before {
            tracing::trace!(hook = hook.name(), "before hook");
            hook.call(req, resp, resource, params).await?;
        }
        Ok(())
    }

    /// Runs the after-hooks in declaration order, stopping at the first
    /// interrupt.
    pub async fn run_after(
        &self,
        req: &mut Request,
        resp: &mut ResponseState,
        resource: &dyn Resource,
    ) -> StageResult {
        for hook in &self.after {
            tracing::trace!(hook = hook.name(), "after hook");
            hook.call(req, resp, resource).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.describe()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FnResource;
    use heron_core::{ExecutionModel, Interrupt, RequestContext, Signal};
    use http::{Method, StatusCode, Uri};
    use parking_lot::Mutex;

    fn request(model: ExecutionModel) -> Request {
        Request::new(Method::GET, Uri::from_static("/"))
            .with_context(RequestContext::new().with_execution_model(model))
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Before {
        let log = Arc::clone(log);
        Before::new(move |_req, _resp, _resource, _params| {
            log.lock().push(label);
            Ok(())
        })
        .named(label)
    }

    #[tokio::test]
    async fn test_before_hooks_run_in_declaration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = HookChain::new();
        chain.push_before(recorder(&log, "one"));
        chain.push_before(recorder(&log, "two"));
        chain.push_before(recorder(&log, "three"));

        let resource = FnResource::new("items");
        let mut req = request(ExecutionModel::Cooperative);
        let mut resp = ResponseState::new();
        let mut params = Params::new();

        chain
            .run_before(&mut req, &mut resp, &resource, &mut params)
            .await
            .unwrap();
        assert_eq!(*log.lock(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_signal_stops_remaining_before_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = HookChain::new();
        chain.push_before(recorder(&log, "first"));
        chain.push_before(Before::new(|_req, _resp, _resource, _params| {
            Err(Signal::new(StatusCode::OK).text("Pass").into())
        }));
        chain.push_before(recorder(&log, "never"));

        let resource = FnResource::new("items");
        let mut req = request(ExecutionModel::Cooperative);
        let mut resp = ResponseState::new();
        let mut params = Params::new();

        let outcome = chain
            .run_before(&mut req, &mut resp, &resource, &mut params)
            .await;
        assert!(matches!(outcome, Err(Interrupt::Signal(_))));
        assert_eq!(*log.lock(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_before_hook_can_rewrite_params() {
        let mut chain = HookChain::new();
        chain.push_before(Before::new(|_req, _resp, _resource, params| {
            params.insert("id", "rewritten");
            Ok(())
        }));

        let resource = FnResource::new("items");
        let mut req = request(ExecutionModel::Blocking);
        let mut resp = ResponseState::new();
        let mut params = Params::new();
        params.insert("id", "7");

        chain
            .run_before(&mut req, &mut resp, &resource, &mut params)
            .await
            .unwrap();
        assert_eq!(params.get("id"), Some("rewritten"));
    }

    #[tokio::test]
    async fn test_dual_form_follows_execution_model() {
        let hook = After::new(|_req, resp, _resource| {
            resp.set_text("sync");
            Ok(())
        })
        .with_async(|_req, resp, _resource| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                resp.set_text("async");
                Ok(())
            })
        });
        let resource = FnResource::new("items");

        for (model, expected) in [
            (ExecutionModel::Blocking, "sync"),
            (ExecutionModel::Cooperative, "async"),
        ] {
            let mut req = request(model);
            let mut resp = ResponseState::new();
            hook.call(&mut req, &mut resp, &resource).await.unwrap();
            assert_eq!(resp.text(), expected);
        }
    }

    #[tokio::test]
    async fn test_async_only_hooks_run_under_both_models() {
        let before = Before::new_async(|_req, resp, _resource, params| {
            Box::pin(async move {
                params.insert("seen", "yes");
                resp.set_header("x-before", "async")?;
                Ok(())
            })
        });
        let after = After::new_async(|_req, resp, _resource| {
            Box::pin(async move {
                resp.set_text("after");
                Ok(())
            })
        });
        let resource = FnResource::new("items");

        for model in [ExecutionModel::Blocking, ExecutionModel::Cooperative] {
            let mut req = request(model);
            let mut resp = ResponseState::new();
            let mut params = Params::new();

            before
                .call(&mut req, &mut resp, &resource, &mut params)
                .await
                .unwrap();
            after.call(&mut req, &mut resp, &resource).await.unwrap();

            assert_eq!(params.get("seen"), Some("yes"));
            assert_eq!(resp.header("x-before"), Some("async"));
            assert_eq!(resp.text(), "after");
        }
    }

    #[tokio::test]
    async fn test_after_hook_signal_skips_later_after_hooks() {
        let mut chain = HookChain::new();
        chain.push_after(After::new(|_req, _resp, _resource| {
            Err(Signal::new(StatusCode::ACCEPTED).into())
        }));
        chain.push_after(After::new(|_req, resp, _resource| {
            resp.set_text("unreachable");
            Ok(())
        }));

        let resource = FnResource::new("items");
        let mut req = request(ExecutionModel::Cooperative);
        let mut resp = ResponseState::new();

        let outcome = chain.run_after(&mut req, &mut resp, &resource).await;
        assert!(outcome.is_err());
        assert_eq!(resp.text(), "");
    }

    #[test]
    fn test_describe_reports_positions_and_phases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = HookChain::new();
        chain.push_before(recorder(&log, "a"));
        chain.push_before(recorder(&log, "b"));
        chain.push_after(After::new(|_req, _resp, _resource| Ok(())).named("c"));

        let described = chain.describe();
        assert_eq!(
            described,
            vec![
                HookInfo {
                    name: "a",
                    position: 0,
                    phase: HookPhase::Before,
                },
                HookInfo {
                    name: "b",
                    position: 1,
                    phase: HookPhase::Before,
                },
                HookInfo {
                    name: "c",
                    position: 0,
                    phase: HookPhase::After,
                },
            ]
        );
    }
}
