//! Dual sync/async callables.
//!
//! Every hook, middleware phase and responder built from closures may carry a
//! synchronous form, an asynchronous form, or both. The form invoked for a
//! request is chosen from the request's [`ExecutionModel`]: blocking requests
//! prefer the sync form and cooperative requests prefer the async form, each
//! falling back to the other when only one is present.
//!
//! Sync forms are adapted into ready futures, so the executor only ever sees
//! one future-returning shape.

use crate::resource::Resource;
use heron_core::{ExecutionModel, Params, Request, ResponseState, StageResult};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Wraps an already computed value into a [`BoxFuture`].
pub fn ready<'a, T: Send + 'a>(value: T) -> BoxFuture<'a, T> {
    Box::pin(std::future::ready(value))
}

/// Sync request-phase callable.
pub type SyncRequestFn = dyn Fn(&mut Request, &mut ResponseState) -> StageResult + Send + Sync;

/// Async request-phase callable.
pub type AsyncRequestFn = dyn for<'a> Fn(
        &'a mut Request,
        &'a mut ResponseState,
    ) -> BoxFuture<'a, StageResult>
    + Send
    + Sync;

/// Sync resource-phase callable, also the shape of a before-hook.
pub type SyncResourceFn = dyn Fn(
        &mut Request,
        &mut ResponseState,
        &dyn Resource,
        &mut Params,
    ) -> StageResult
    + Send
    + Sync;

/// Async resource-phase callable, also the shape of a before-hook.
pub type AsyncResourceFn = dyn for<'a> Fn(
        &'a mut Request,
        &'a mut ResponseState,
        &'a dyn Resource,
        &'a mut Params,
    ) -> BoxFuture<'a, StageResult>
    + Send
    + Sync;

/// Sync response-phase callable.
pub type SyncResponseFn = dyn Fn(
        &mut Request,
        &mut ResponseState,
        Option<&dyn Resource>,
        bool,
    ) -> StageResult
    + Send
    + Sync;

/// Async response-phase callable.
pub type AsyncResponseFn = dyn for<'a> Fn(
        &'a mut Request,
        &'a mut ResponseState,
        Option<&'a dyn Resource>,
        bool,
    ) -> BoxFuture<'a, StageResult>
    + Send
    + Sync;

/// Sync after-hook callable.
pub type SyncAfterFn =
    dyn Fn(&mut Request, &mut ResponseState, &dyn Resource) -> StageResult + Send + Sync;

/// Async after-hook callable.
pub type AsyncAfterFn = dyn for<'a> Fn(
        &'a mut Request,
        &'a mut ResponseState,
        &'a dyn Resource,
    ) -> BoxFuture<'a, StageResult>
    + Send
    + Sync;

/// Sync responder callable.
pub type SyncResponderFn =
    dyn Fn(&mut Request, &mut ResponseState, &Params) -> StageResult + Send + Sync;

/// Async responder callable.
pub type AsyncResponderFn = dyn for<'a> Fn(
        &'a mut Request,
        &'a mut ResponseState,
        &'a Params,
    ) -> BoxFuture<'a, StageResult>
    + Send
    + Sync;

/// The sync and async forms of one callable.
pub(crate) struct Forms<S: ?Sized, A: ?Sized> {
    sync: Option<Box<S>>,
    asynchronous: Option<Box<A>>,
}

/// The form picked for one invocation.
pub(crate) enum Selected<'f, S: ?Sized, A: ?Sized> {
    Sync(&'f S),
    Async(&'f A),
}

impl<S: ?Sized, A: ?Sized> Forms<S, A> {
    pub(crate) fn set_sync(&mut self, f: Box<S>) {
        self.sync = Some(f);
    }

    pub(crate) fn set_async(&mut self, f: Box<A>) {
        self.asynchronous = Some(f);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_none() && self.asynchronous.is_none()
    }

    pub(crate) fn has_sync(&self) -> bool {
        self.sync.is_some()
    }

    pub(crate) fn has_async(&self) -> bool {
        self.asynchronous.is_some()
    }

    pub(crate) fn select(&self, model: ExecutionModel) -> Option<Selected<'_, S, A>> {
        let sync = self.sync.as_deref().map(Selected::Sync);
        let asynchronous = self.asynchronous.as_deref().map(Selected::Async);
        match model {
            ExecutionModel::Blocking => sync.or(asynchronous),
            ExecutionModel::Cooperative => asynchronous.or(sync),
        }
    }
}

impl<S: ?Sized, A: ?Sized> Default for Forms<S, A> {
    fn default() -> Self {
        Self {
            sync: None,
            asynchronous: None,
        }
    }
}

impl<S: ?Sized, A: ?Sized> std::fmt::Debug for Forms<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forms")
            .field("sync", &self.has_sync())
            .field("async", &self.has_async())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type SyncUnit = dyn Fn() -> &'static str + Send + Sync;

    fn both() -> Forms<SyncUnit, SyncUnit> {
        let mut forms: Forms<SyncUnit, SyncUnit> = Forms::default();
        forms.set_sync(Box::new(|| "sync"));
        forms.set_async(Box::new(|| "async"));
        forms
    }

    fn call(selected: Option<Selected<'_, SyncUnit, SyncUnit>>) -> Option<&'static str> {
        match selected? {
            Selected::Sync(f) | Selected::Async(f) => Some(f()),
        }
    }

    #[test]
    fn test_model_picks_matching_form() {
        let forms = both();
        assert_eq!(call(forms.select(ExecutionModel::Blocking)), Some("sync"));
        assert_eq!(call(forms.select(ExecutionModel::Cooperative)), Some("async"));
    }

    #[test]
    fn test_falls_back_to_only_form() {
        let mut sync_only: Forms<SyncUnit, SyncUnit> = Forms::default();
        sync_only.set_sync(Box::new(|| "sync"));
        assert_eq!(call(sync_only.select(ExecutionModel::Cooperative)), Some("sync"));

        let mut async_only: Forms<SyncUnit, SyncUnit> = Forms::default();
        async_only.set_async(Box::new(|| "async"));
        assert_eq!(call(async_only.select(ExecutionModel::Blocking)), Some("async"));
    }

    #[test]
    fn test_empty_forms_select_nothing() {
        let forms: Forms<SyncUnit, SyncUnit> = Forms::default();
        assert!(forms.is_empty());
        assert!(forms.select(ExecutionModel::Blocking).is_none());
    }

    #[tokio::test]
    async fn test_ready_resolves_immediately() {
        assert_eq!(ready(5).await, 5);
    }
}
