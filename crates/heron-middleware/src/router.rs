//! The routing seam used by the pipeline executor.
//!
//! Route matching itself lives outside the executor; the executor only needs
//! to know whether a request resolved to a resource and with which params.

use crate::resource::ResourceRoute;
use heron_core::{Params, Request};
use std::sync::Arc;

/// The outcome of routing one request.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The request path matched a registered resource.
    Found {
        /// The matched resource and its hooks.
        route: Arc<ResourceRoute>,
        /// Parameters captured from the path.
        params: Params,
    },
    /// No resource matches the request path.
    NotFound,
}

/// Resolves requests to resources.
pub trait Router: Send + Sync {
    /// Resolves the request path.
    fn resolve(&self, req: &Request) -> Resolution;
}

/// A router that sends every request to one resource.
///
/// Useful for single-resource services and tests.
#[derive(Debug, Clone)]
pub struct SingleRoute {
    route: Arc<ResourceRoute>,
}

impl SingleRoute {
    /// Routes every request to `route`.
    #[must_use]
    pub fn new(route: ResourceRoute) -> Self {
        Self {
            route: Arc::new(route),
        }
    }
}

impl Router for SingleRoute {
    fn resolve(&self, _req: &Request) -> Resolution {
        Resolution::Found {
            route: Arc::clone(&self.route),
            params: Params::new(),
        }
    }
}

/// A router with no resources; every request resolves to
/// [`Resolution::NotFound`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoutes;

impl Router for NoRoutes {
    fn resolve(&self, _req: &Request) -> Resolution {
        Resolution::NotFound
    }
}
