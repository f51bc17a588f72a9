//! Route table mapping URI templates to resources.
//!
//! Templates are `/`-separated segments; a segment is either literal text or
//! a `{name}` parameter that captures exactly one path segment:
//!
//! ```text
//! /items              static
//! /items/{id}         one parameter
//! /items/{id}/parts   parameter between literals
//! ```
//!
//! When several templates match a path, the one whose literal segments come
//! first wins, so `/items/latest` beats `/items/{id}` for `/items/latest`.

use heron_core::{HeronError, HeronResult, Params, Request};
use heron_middleware::{Resolution, ResourceRoute, Router};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str, template: &str) -> HeronResult<Self> {
        if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(HeronError::invalid_route(format!(
                    "invalid parameter name '{name}' in '{template}'"
                )));
            }
            return Ok(Self::Param(name.to_string()));
        }
        if raw.contains(['{', '}']) {
            return Err(HeronError::invalid_route(format!(
                "segment '{raw}' in '{template}' mixes literal text and a parameter"
            )));
        }
        Ok(Self::Static(raw.to_string()))
    }

    const fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

#[derive(Debug)]
struct Entry {
    template: String,
    segments: Vec<Segment>,
    route: Arc<ResourceRoute>,
}

impl Entry {
    fn specificity(&self) -> Vec<bool> {
        self.segments.iter().map(Segment::is_static).collect()
    }

    /// Two templates conflict when they differ only in parameter names.
    fn conflicts_with(&self, segments: &[Segment]) -> bool {
        self.segments.len() == segments.len()
            && self.segments.iter().zip(segments).all(|pair| match pair {
                (Segment::Static(a), Segment::Static(b)) => a == b,
                (Segment::Param(_), Segment::Param(_)) => true,
                _ => false,
            })
    }

    fn matches(&self, path: &[&str]) -> Option<Params> {
        if self.segments.len() != path.len() {
            return None;
        }
        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(path) {
            match segment {
                Segment::Static(text) if text == part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => params.insert(name.as_str(), *part),
            }
        }
        Some(params)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Resources registered by URI template.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<Entry>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `route` under `template`.
    ///
    /// # Errors
    ///
    /// Returns [`HeronError::InvalidRoute`] if the template is malformed,
    /// repeats a parameter name, or conflicts with a registered template.
    pub fn insert(&mut self, template: &str, route: ResourceRoute) -> HeronResult<()> {
        if !template.starts_with('/') {
            return Err(HeronError::invalid_route(format!(
                "template '{template}' must start with '/'"
            )));
        }

        let segments = split_path(template)
            .into_iter()
            .map(|raw| Segment::parse(raw, template))
            .collect::<HeronResult<Vec<_>>>()?;

        let mut names: Vec<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Static(_) => None,
            })
            .collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(HeronError::invalid_route(format!(
                "parameter '{}' repeated in '{template}'",
                pair[0]
            )));
        }

        if let Some(existing) = self.entries.iter().find(|e| e.conflicts_with(&segments)) {
            return Err(HeronError::invalid_route(format!(
                "'{template}' conflicts with '{}'",
                existing.template
            )));
        }

        tracing::debug!(template, resource = route.resource().name(), "route added");
        self.entries.push(Entry {
            template: template.to_string(),
            segments,
            route: Arc::new(route),
        });
        // Stable, so registration order survives among equals.
        self.entries
            .sort_by(|a, b| b.specificity().cmp(&a.specificity()));
        Ok(())
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the registered templates in match priority order.
    #[must_use]
    pub fn templates(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.template.as_str()).collect()
    }

    /// Resolves a path to a route and its captured params.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<(&Arc<ResourceRoute>, Params)> {
        let parts = split_path(path);
        self.entries
            .iter()
            .find_map(|e| e.matches(&parts).map(|params| (&e.route, params)))
    }
}

impl Router for RouteTable {
    fn resolve(&self, req: &Request) -> Resolution {
        match self.find(req.path()) {
            Some((route, params)) => Resolution::Found {
                route: Arc::clone(route),
                params,
            },
            None => Resolution::NotFound,
        }
    }
}
