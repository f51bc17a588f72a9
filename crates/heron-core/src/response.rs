//! The per-request response accumulator.
//!
//! [`ResponseState`] is owned by the pipeline executor for the duration of one
//! request. Every stage may write to it; header names are case-insensitive and
//! the last writer for a name wins. A raised [`Signal`](crate::Signal) is
//! applied onto it.

use crate::error::HeronResult;
use crate::status::Status;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use http_body_util::Full;
use std::borrow::Cow;

/// The HTTP response type produced at the transport boundary.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// Mutable response state shared by every stage of one request.
///
/// # Example
///
/// ```
/// use heron_core::ResponseState;
/// use http::StatusCode;
///
/// let mut resp = ResponseState::new();
/// assert_eq!(resp.status(), "200 OK");
///
/// resp.set_status(StatusCode::CREATED);
/// resp.set_header("Location", "/items/1").unwrap();
/// resp.set_text("created");
///
/// assert_eq!(resp.header("location"), Some("/items/1"));
/// assert_eq!(resp.text(), "created");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseState {
    status: Status,
    headers: HeaderMap,
    body: Option<Bytes>,
    complete: bool,
}

impl ResponseState {
    /// Creates a response with status `200 OK`, no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: impl Into<Status>) {
        self.status = status.into();
    }

    /// Sets the status from a numeric code.
    pub fn set_status_code(&mut self, code: u16) -> HeronResult<()> {
        self.status = Status::from_code(code)?;
        Ok(())
    }

    /// Sets the status from a full status line.
    pub fn set_status_line(&mut self, line: &str) -> HeronResult<()> {
        self.status = Status::parse(line)?;
        Ok(())
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a header value as a string, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing any existing values for the name.
    pub fn set_header<K, V>(&mut self, name: K, value: V) -> HeronResult<()>
    where
        K: TryInto<HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        let name = name.try_into().map_err(Into::<http::Error>::into)?;
        let value = value.try_into().map_err(Into::<http::Error>::into)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Removes a header, returning its first value if present.
    pub fn remove_header(&mut self, name: &str) -> Option<HeaderValue> {
        self.headers.remove(name)
    }

    /// Returns the raw body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the body as text; an absent body reads as the empty string.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match &self.body {
            Some(body) => String::from_utf8_lossy(body),
            None => Cow::Borrowed(""),
        }
    }

    /// Replaces the body with text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.body = Some(Bytes::from(text.into()));
    }

    /// Replaces the body with a raw payload.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Removes the body.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// Returns `true` once a stage has declared the response complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Declares the response complete.
    ///
    /// Forward processing stops after the current stage: remaining request and
    /// resource stages, hooks and the responder are skipped. The response
    /// phase still runs.
    pub fn set_complete(&mut self) {
        self.complete = true;
    }

    /// Converts the accumulated state into an HTTP response.
    ///
    /// Custom reason phrases are not representable in [`http::Response`] and
    /// are dropped; the numeric code is kept.
    #[must_use]
    pub fn into_http(self) -> HttpResponse {
        let mut response = http::Response::new(Full::new(self.body.unwrap_or_default()));
        *response.status_mut() = self.status.code();
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;

    #[test]
    fn test_defaults() {
        let resp = ResponseState::new();
        assert_eq!(resp.status(), "200 OK");
        assert!(resp.headers().is_empty());
        assert!(resp.body().is_none());
        assert!(!resp.is_complete());
    }

    #[test]
    fn test_status_forms() {
        let mut resp = ResponseState::new();
        resp.set_status_line("500 Internal Server Error").unwrap();
        let textual = resp.status().clone();

        resp.set_status_code(500).unwrap();
        assert_eq!(resp.status(), &textual);

        assert!(resp.set_status_code(7).is_err());
        assert!(resp.set_status_line("nope").is_err());
        assert_eq!(resp.status(), &textual);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut resp = ResponseState::new();
        resp.set_header("X-Failed", "True").unwrap();
        resp.set_header("x-failed", "False").unwrap();

        assert_eq!(resp.headers().len(), 1);
        assert_eq!(resp.header("X-FAILED"), Some("False"));

        assert!(resp.remove_header("X-Failed").is_some());
        assert_eq!(resp.header("x-failed"), None);
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let mut resp = ResponseState::new();
        assert!(resp.set_header("x-bad", "line\nbreak").is_err());
        assert!(resp.headers().is_empty());
    }

    #[test]
    fn test_body_handling() {
        let mut resp = ResponseState::new();
        assert_eq!(resp.text(), "");

        resp.set_text("hello");
        assert_eq!(resp.text(), "hello");

        resp.set_body(vec![0xff, 0xfe]);
        assert_eq!(resp.body().map(Bytes::len), Some(2));

        resp.clear_body();
        assert!(resp.body().is_none());
    }

    #[tokio::test]
    async fn test_into_http() {
        let mut resp = ResponseState::new();
        resp.set_status(StatusCode::ACCEPTED);
        resp.set_header("x-id", "7").unwrap();
        resp.set_text("queued");

        let http = resp.into_http();
        assert_eq!(http.status(), StatusCode::ACCEPTED);
        assert_eq!(http.headers().get("x-id").unwrap(), "7");

        let body = http.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("queued"));
    }
}
