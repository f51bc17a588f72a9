//! Request context types.
//!
//! The [`RequestContext`] carries per-request state through every stage of the
//! pipeline: the request id, timing, the execution model the request is driven
//! under, a recorded fault (if any) and typed extensions shared between stages.

use crate::error::HeronError;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for consecutive requests
/// sortable by id.
///
/// # Example
///
/// ```
/// use heron_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// How the stages of a request are scheduled.
///
/// Both models observe the same ordering and short-circuit rules. The model
/// decides which form of a dual sync/async stage is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionModel {
    /// Each stage runs to completion on the caller's thread.
    Blocking,
    /// Stages may suspend without blocking other requests.
    #[default]
    Cooperative,
}

impl ExecutionModel {
    /// Returns the model name as used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Cooperative => "cooperative",
        }
    }
}

impl std::fmt::Display for ExecutionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request state that flows through the pipeline.
///
/// # Example
///
/// ```
/// use heron_core::{ExecutionModel, RequestContext};
///
/// let ctx = RequestContext::new().with_execution_model(ExecutionModel::Blocking);
/// assert_eq!(ctx.execution_model(), ExecutionModel::Blocking);
/// assert!(ctx.fault().is_none());
/// ```
#[derive(Debug)]
pub struct RequestContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// When the request started processing.
    started_at: Instant,

    execution_model: ExecutionModel,

    /// A fault raised before the response phase and not yet handled.
    fault: Option<HeronError>,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the request ID was provided by a client or upstream service.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            execution_model: ExecutionModel::default(),
            fault: None,
            extensions: HashMap::new(),
        }
    }

    /// Sets the execution model (builder style).
    #[must_use]
    pub fn with_execution_model(mut self, model: ExecutionModel) -> Self {
        self.execution_model = model;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the execution model this request is driven under.
    #[must_use]
    pub fn execution_model(&self) -> ExecutionModel {
        self.execution_model
    }

    /// Sets the execution model.
    pub fn set_execution_model(&mut self, model: ExecutionModel) {
        self.execution_model = model;
    }

    /// Records a fault. A previously recorded fault is replaced.
    pub fn record_fault(&mut self, fault: HeronError) {
        self.fault = Some(fault);
    }

    /// Returns the recorded fault, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&HeronError> {
        self.fault.as_ref()
    }

    /// Removes the recorded fault, marking it as handled.
    ///
    /// A response-phase stage that converts a fault into a regular response
    /// calls this so the fault does not reach the transport boundary.
    pub fn take_fault(&mut self) -> Option<HeronError> {
        self.fault.take()
    }

    /// Stores a typed extension value.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_core::RequestContext;
    ///
    /// struct Tenant(&'static str);
    ///
    /// let mut ctx = RequestContext::new();
    /// ctx.set_extension(Tenant("acme"));
    ///
    /// assert_eq!(ctx.get_extension::<Tenant>().map(|t| t.0), Some("acme"));
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Retrieves a typed extension value mutably.
    pub fn get_extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
