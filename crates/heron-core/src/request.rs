//! The request as seen by pipeline stages.

use crate::context::RequestContext;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use http_body_util::{BodyExt, Full};

/// The HTTP request type accepted at the transport boundary.
pub type HttpRequest = http::Request<Full<Bytes>>;

/// An incoming request together with its per-request context.
///
/// Stages receive the request mutably so they can attach state to its
/// [`RequestContext`].
///
/// # Example
///
/// ```
/// use heron_core::Request;
/// use http::Method;
///
/// let req = Request::new(Method::GET, "/items/7".parse().unwrap())
///     .with_header("accept", "text/plain")
///     .unwrap();
///
/// assert_eq!(req.path(), "/items/7");
/// assert_eq!(req.header("Accept"), Some("text/plain"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    context: RequestContext,
}

impl Request {
    /// Creates a request with no headers, an empty body and a fresh context.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            context: RequestContext::new(),
        }
    }

    /// Converts an HTTP request, buffering its body.
    pub async fn from_http(req: HttpRequest) -> Self {
        let (parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            context: RequestContext::new(),
        }
    }

    /// Adds a header (builder style).
    pub fn with_header<K, V>(mut self, name: K, value: V) -> crate::HeronResult<Self>
    where
        K: TryInto<http::HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<http::HeaderValue>,
        V::Error: Into<http::Error>,
    {
        let name = name.try_into().map_err(Into::<http::Error>::into)?;
        let value = value.try_into().map_err(Into::<http::Error>::into)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Sets the body (builder style).
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replaces the context (builder style).
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the buffered body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the per-request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Returns the per-request context mutably.
    pub fn context_mut(&mut self) -> &mut RequestContext {
        &mut self.context
    }
}
