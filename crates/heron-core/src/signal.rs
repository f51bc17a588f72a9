//! Short-circuit signals.
//!
//! A [`Signal`] is raised by any stage (middleware phase, hook or responder)
//! that has already decided the final response. Returning it as an
//! [`Interrupt`](crate::Interrupt) abandons the stage and the rest of its
//! stage group; the executor applies it to the [`ResponseState`] exactly once
//! and continues with the response phase.
//!
//! # Example
//!
//! ```
//! use heron_core::{ResponseState, Signal};
//! use http::StatusCode;
//!
//! let signal = Signal::new(StatusCode::OK)
//!     .header("X-Failed", "False")
//!     .unwrap()
//!     .text("Pass");
//!
//! let mut resp = ResponseState::new();
//! resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
//! resp.set_text("Fail");
//!
//! signal.apply(&mut resp);
//! assert_eq!(resp.status(), "200 OK");
//! assert_eq!(resp.header("x-failed"), Some("False"));
//! assert_eq!(resp.text(), "Pass");
//! ```

use crate::error::HeronResult;
use crate::response::ResponseState;
use crate::status::Status;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};

/// The body carried by a [`Signal`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SignalBody {
    /// Leave the accumulated body untouched.
    #[default]
    Unset,
    /// Clear the accumulated body.
    Empty,
    /// Replace the body with text.
    Text(String),
    /// Replace the body with a raw payload.
    Raw(Bytes),
}

/// An immutable "the response is already decided" value.
#[derive(Debug, Clone)]
#[must_use = "a signal has no effect until it is returned from a stage"]
pub struct Signal {
    status: Status,
    headers: HeaderMap,
    body: SignalBody,
}

impl Signal {
    /// Creates a signal with the given status, no header overrides and an
    /// unset body.
    pub fn new(status: impl Into<Status>) -> Self {
        Self {
            status: status.into(),
            headers: HeaderMap::new(),
            body: SignalBody::Unset,
        }
    }

    /// Creates a signal from a numeric status code.
    pub fn from_code(code: u16) -> HeronResult<Self> {
        Status::from_code(code).map(Self::new)
    }

    /// Creates a signal from a full status line.
    pub fn from_status_line(line: &str) -> HeronResult<Self> {
        Status::parse(line).map(Self::new)
    }

    /// Adds a header override. Names are case-insensitive; the last value for
    /// a name wins.
    pub fn header<K, V>(mut self, name: K, value: V) -> HeronResult<Self>
    where
        K: TryInto<HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        let name = name.try_into().map_err(Into::<http::Error>::into)?;
        let value = value.try_into().map_err(Into::<http::Error>::into)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds every header from an existing map, overwriting earlier values.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        // Names already present are replaced.
        self.headers.extend(headers);
        self
    }

    /// Sets a text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = SignalBody::Text(text.into());
        self
    }

    /// Sets a raw payload body.
    pub fn raw(mut self, payload: impl Into<Bytes>) -> Self {
        self.body = SignalBody::Raw(payload.into());
        self
    }

    /// Marks the body as explicitly empty, clearing any accumulated body.
    pub fn clear_body(mut self) -> Self {
        self.body = SignalBody::Empty;
        self
    }

    /// Returns the normalized status.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the header overrides.
    #[must_use]
    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body instruction.
    #[must_use]
    pub fn body(&self) -> &SignalBody {
        &self.body
    }

    /// Applies this signal to the response accumulator.
    ///
    /// The status is overwritten, headers are merged (a name carried by the
    /// signal replaces the response's values for that name, keeping every
    /// value the signal holds for it), and the body is replaced unless it is
    /// [`SignalBody::Unset`].
    pub fn apply(self, resp: &mut ResponseState) {
        resp.set_status(self.status);

        let mut last_name: Option<HeaderName> = None;
        for (name, value) in self.headers {
            match name {
                Some(name) => {
                    resp.headers_mut().insert(name.clone(), value);
                    last_name = Some(name);
                }
                // `None` continues the previous name's values.
                None => {
                    if let Some(name) = &last_name {
                        resp.headers_mut().append(name, value);
                    }
                }
            }
        }

        match self.body {
            SignalBody::Unset => {}
            SignalBody::Empty => resp.clear_body(),
            SignalBody::Text(text) => resp.set_text(text),
            SignalBody::Raw(payload) => resp.set_body(payload),
        }
    }
}
