//! The classification vocabulary for a single resolution attempt.
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Failures a service may report for a code.
///
/// `NoRedirect` and `CodeBlocked` are confident statements about the code.
/// `ServiceBlocked` and `Service` say nothing about the code and are safe to
/// retry later.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    #[error("No redirect")]
    NoRedirect,
    #[error("Code blocked{}", describe(.0))]
    CodeBlocked(Option<String>),
    #[error("Service blocked{}", describe(.0))]
    ServiceBlocked(Option<String>),
    #[error("Service error: {0}")]
    Service(String),
}

fn describe(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|reason| format!(": {}", reason))
        .unwrap_or_default()
}

impl Error {
    pub(crate) fn code_blocked<S: Into<String>>(reason: S) -> Self {
        Error::CodeBlocked(Some(reason.into()))
    }

    pub(crate) fn service_blocked<S: Into<String>>(reason: S) -> Self {
        Error::ServiceBlocked(Some(reason.into()))
    }

    pub(crate) fn service<S: Into<String>>(message: S) -> Self {
        Error::Service(message.into())
    }
}

/// The target of a short code.
///
/// Services may return arbitrary bytes here, so the value is never required
/// to be valid UTF-8 or a well-formed URL.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LongUrl(Bytes);

impl LongUrl {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LongUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<Bytes> for LongUrl {
    fn from(value: Bytes) -> Self {
        LongUrl(value)
    }
}

impl From<&[u8]> for LongUrl {
    fn from(value: &[u8]) -> Self {
        LongUrl(Bytes::copy_from_slice(value))
    }
}

impl From<String> for LongUrl {
    fn from(value: String) -> Self {
        LongUrl(Bytes::from(value))
    }
}

impl From<&str> for LongUrl {
    fn from(value: &str) -> Self {
        LongUrl(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl PartialEq<&str> for LongUrl {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

/// Flattened result of one `fetch` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    LongUrl(LongUrl),
    NoRedirect,
    CodeBlocked(Option<String>),
    ServiceBlocked(Option<String>),
    ServiceError(String),
}

impl Outcome {
    /// Whether another attempt for the same code could produce a different
    /// classification.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::ServiceBlocked(_) | Outcome::ServiceError(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::LongUrl(_) => "redirect",
            Outcome::NoRedirect => "no-redirect",
            Outcome::CodeBlocked(_) => "code-blocked",
            Outcome::ServiceBlocked(_) => "service-blocked",
            Outcome::ServiceError(_) => "service-error",
        }
    }

    /// The URL or diagnostic attached to this outcome, if any.
    ///
    /// URLs are returned as the service sent them, which may not be UTF-8.
    pub fn detail(&self) -> Option<&[u8]> {
        match self {
            Outcome::LongUrl(url) => Some(url.as_bytes()),
            Outcome::NoRedirect => None,
            Outcome::CodeBlocked(reason) | Outcome::ServiceBlocked(reason) => {
                reason.as_deref().map(str::as_bytes)
            }
            Outcome::ServiceError(message) => Some(message.as_bytes()),
        }
    }
}

impl From<Result<LongUrl, Error>> for Outcome {
    fn from(result: Result<LongUrl, Error>) -> Self {
        match result {
            Ok(url) => Outcome::LongUrl(url),
            Err(Error::NoRedirect) => Outcome::NoRedirect,
            Err(Error::CodeBlocked(reason)) => Outcome::CodeBlocked(reason),
            Err(Error::ServiceBlocked(reason)) => Outcome::ServiceBlocked(reason),
            Err(Error::Service(message)) => Outcome::ServiceError(message),
        }
    }
}
