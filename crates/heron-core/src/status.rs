//! HTTP status line normalization.
//!
//! Stages may set a status either as a numeric code or as a full status line.
//! Both forms are normalized to the canonical `"<code> <reason phrase>"` text,
//! so `Status::from_code(200)` and `"200 OK".parse::<Status>()` compare (and
//! render) byte-identically.
//!
//! A status line with an explicit, non-canonical reason phrase keeps that
//! phrase; a bare code gets the canonical reason.

use crate::error::{HeronError, HeronResult};
use http::StatusCode;
use std::fmt;
use std::str::FromStr;

/// Reason phrase used for codes without a registered canonical reason.
const UNKNOWN_REASON: &str = "Unknown";

/// A normalized HTTP status line.
///
/// # Example
///
/// ```
/// use heron_core::Status;
///
/// let numeric = Status::from_code(404).unwrap();
/// let textual: Status = "404 Not Found".parse().unwrap();
///
/// assert_eq!(numeric, textual);
/// assert_eq!(numeric.as_str(), "404 Not Found");
/// assert_eq!(numeric.as_u16(), 404);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Status {
    code: StatusCode,
    line: String,
}

impl Status {
    /// Creates a status from a numeric code.
    ///
    /// Codes outside `100..=999` are rejected.
    pub fn from_code(code: u16) -> HeronResult<Self> {
        StatusCode::from_u16(code)
            .map(Self::from)
            .map_err(|_| HeronError::invalid_status(code.to_string()))
    }

    /// Parses a status line such as `"500 Internal Server Error"` or `"204"`.
    ///
    /// Surrounding whitespace is ignored. A missing reason phrase is filled
    /// in with the canonical one.
    pub fn parse(line: &str) -> HeronResult<Self> {
        let trimmed = line.trim();
        let (code_part, reason) = match trimmed.split_once(char::is_whitespace) {
            Some((code, reason)) => (code, reason.trim()),
            None => (trimmed, ""),
        };

        if code_part.len() != 3 || !code_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HeronError::invalid_status(line));
        }
        if reason.chars().any(char::is_control) {
            return Err(HeronError::invalid_status(line));
        }

        let code = StatusCode::from_bytes(code_part.as_bytes())
            .map_err(|_| HeronError::invalid_status(line))?;

        if reason.is_empty() {
            Ok(Self::from(code))
        } else {
            Ok(Self {
                code,
                line: format!("{} {}", code.as_str(), reason),
            })
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the status code as a `u16`.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.code.as_u16()
    }

    /// Returns the full normalized status line.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Returns the reason phrase.
    #[must_use]
    pub fn reason(&self) -> &str {
        // The line always starts with three digits and a space.
        &self.line[4..]
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::from(StatusCode::OK)
    }
}

impl From<StatusCode> for Status {
    fn from(code: StatusCode) -> Self {
        let reason = code.canonical_reason().unwrap_or(UNKNOWN_REASON);
        Self {
            code,
            line: format!("{} {}", code.as_str(), reason),
        }
    }
}

impl TryFrom<u16> for Status {
    type Error = HeronError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl TryFrom<&str> for Status {
    type Error = HeronError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        Self::parse(line)
    }
}

impl FromStr for Status {
    type Err = HeronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

impl PartialEq<str> for Status {
    fn eq(&self, other: &str) -> bool {
        self.line == other
    }
}

impl PartialEq<&str> for Status {
    fn eq(&self, other: &&str) -> bool {
        self.line == *other
    }
}
