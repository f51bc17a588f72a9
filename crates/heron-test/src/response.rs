//! Simulated response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use heron_core::{ResponseState, Status};
use http::HeaderMap;
use serde::de::DeserializeOwned;

/// The final response of a simulated request.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: Status,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl From<ResponseState> for TestResponse {
    fn from(resp: ResponseState) -> Self {
        Self {
            status: resp.status().clone(),
            headers: resp.headers().clone(),
            body: resp.body().cloned(),
        }
    }
}

impl TestResponse {
    /// Returns the status line, e.g. `"200 OK"`.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the numeric status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body, if one was set.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the body as text; empty when no body was set.
    #[must_use]
    pub fn text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        let body = self.body.as_deref().unwrap_or_default();
        Ok(serde_json::from_slice(body)?)
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code differs.
    #[track_caller]
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status_code(),
            expected,
            "expected status {expected}, got '{}' with body {:?}",
            self.status,
            self.text()
        );
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    #[track_caller]
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(
            self.header(name),
            Some(expected),
            "header '{name}' mismatch"
        );
        self
    }

    /// Asserts the body text.
    ///
    /// # Panics
    ///
    /// Panics if the body differs.
    #[track_caller]
    pub fn assert_text(&self, expected: &str) -> &Self {
        assert_eq!(self.text(), expected, "body mismatch");
        self
    }
}
