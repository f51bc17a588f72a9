//! Simulated request builder.

use crate::error::TestError;
use bytes::Bytes;
use heron_core::{ExecutionModel, Request, RequestContext};
use http::{header, Method, Uri};
use serde::Serialize;

/// A request to simulate, built fluently.
///
/// # Example
///
/// ```
/// use heron_test::TestRequest;
///
/// let request = TestRequest::post("/items")
///     .header("X-Trace", "abc")
///     .text("hello");
/// assert_eq!(request.method().as_str(), "POST");
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl TestRequest {
    /// Creates a request with the given method and URI.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a GET request.
    pub fn get(uri: impl AsRef<str>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Creates a POST request.
    pub fn post(uri: impl AsRef<str>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Creates a PUT request.
    pub fn put(uri: impl AsRef<str>) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Creates a PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> Self {
        Self::new(Method::PATCH, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Appends a header. Validated when the request is built.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a plain-text body.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.body(text.into()).header(header::CONTENT_TYPE.as_str(), "text/plain")
    }

    /// Sets a JSON body and content type.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if `value` does not serialize.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, TestError> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self
            .body(bytes)
            .header(header::CONTENT_TYPE.as_str(), "application/json"))
    }

    /// Builds the pipeline request, tagged with `model`.
    pub(crate) fn build(self, model: ExecutionModel) -> Result<Request, TestError> {
        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI '{}': {e}", self.uri)))?;

        let mut request = Request::new(self.method, uri)
            .with_body(self.body)
            .with_context(RequestContext::new().with_execution_model(model));
        for (name, value) in self.headers {
            request = request
                .with_header(name.as_str(), value.as_str())
                .map_err(|e| TestError::RequestBuild(e.to_string()))?;
        }
        Ok(request)
    }
}
