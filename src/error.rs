// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the XHR adapter
//!
//! Two layers of failure live here:
//!
//! - [`Error`] covers everything that goes wrong *before* a request is sent
//!   (bad URL, bad header, misconfigured client). These surface synchronously
//!   from [`XhrAdapter::execute`](crate::XhrAdapter::execute).
//! - [`ClassifiedError`] and [`Rejection`] are the settled outcome of an
//!   exchange that was actually sent: network failure, timeout, non-2xx status
//!   or cancellation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::adapter::HandleSnapshot;
use crate::cancel::Cancel;
use crate::http::{RequestConfig, Response};

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error code attached to timeout failures
pub const ECONNABORTED: &str = "ECONNABORTED";

/// Main error type for the adapter
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP client failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Method is not a valid HTTP token
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Header rejected by the request handle
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Request handle used out of order (e.g. send before open)
    #[error("Invalid handle state: {0}")]
    InvalidState(String),

    /// Exchange settled with a failure
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Check if this is a settled timeout failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Rejected(r) if r.kind() == Some(ErrorKind::Timeout))
    }

    /// Check if this is a transport-level failure
    pub fn is_network(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Rejected(r) => r.kind() == Some(ErrorKind::Network),
            _ => false,
        }
    }

    /// Check if this is a cancellation
    pub fn is_cancel(&self) -> bool {
        matches!(self, Error::Rejected(r) if r.is_cancel())
    }

    /// Get HTTP status code if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Rejected(r) => r.response().map(|resp| resp.status),
            _ => None,
        }
    }
}

/// Classification of a settled failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure (DNS, connection refused, reset)
    Network,
    /// Configured timeout elapsed before completion
    Timeout,
    /// Completed with a status outside `200..300`
    HttpStatus,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::HttpStatus => "http-status",
        };
        f.write_str(name)
    }
}

/// Failure produced by a sent exchange
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ClassifiedError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Human readable message
    pub message: String,
    /// Config the exchange ran with, including the final header set
    pub config: Arc<RequestConfig>,
    /// Machine readable code (`ECONNABORTED` for timeouts)
    pub code: Option<String>,
    /// State of the request handle at settlement
    pub request: HandleSnapshot,
    /// Response, present only for [`ErrorKind::HttpStatus`]
    pub response: Option<Response>,
}

/// Build a [`ClassifiedError`] from its parts
pub fn create_error(
    kind: ErrorKind,
    message: impl Into<String>,
    config: Arc<RequestConfig>,
    code: Option<&str>,
    request: HandleSnapshot,
    response: Option<Response>,
) -> ClassifiedError {
    ClassifiedError {
        kind,
        message: message.into(),
        config,
        code: code.map(str::to_string),
        request,
        response,
    }
}

/// Why an exchange's outcome future was rejected
#[derive(Error, Debug, Clone)]
pub enum Rejection {
    /// Network, timeout or HTTP status failure
    #[error(transparent)]
    Classified(Box<ClassifiedError>),
    /// Cancel token fired first; the reason is passed through untouched
    #[error(transparent)]
    Cancelled(Cancel),
}

impl Rejection {
    /// Check if this rejection came from a cancel token
    pub fn is_cancel(&self) -> bool {
        matches!(self, Rejection::Cancelled(_))
    }

    /// Failure kind, `None` for cancellations
    pub fn kind(&self) -> Option<ErrorKind> {
        self.classified().map(|e| e.kind)
    }

    /// The classified error, if this is not a cancellation
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Rejection::Classified(err) => Some(err),
            Rejection::Cancelled(_) => None,
        }
    }

    /// The cancellation reason, if this is a cancellation
    pub fn cancel_reason(&self) -> Option<&Cancel> {
        match self {
            Rejection::Cancelled(reason) => Some(reason),
            Rejection::Classified(_) => None,
        }
    }

    /// Response attached to an HTTP status failure
    pub fn response(&self) -> Option<&Response> {
        self.classified().and_then(|e| e.response.as_ref())
    }
}

impl From<ClassifiedError> for Rejection {
    fn from(err: ClassifiedError) -> Self {
        Rejection::Classified(Box::new(err))
    }
}

impl From<Cancel> for Rejection {
    fn from(reason: Cancel) -> Self {
        Rejection::Cancelled(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Arc<RequestConfig> {
        Arc::new(RequestConfig::get("http://api.test/items"))
    }

    #[test]
    fn test_create_timeout_error() {
        let config = config();
        let snapshot = HandleSnapshot::detached(&config);
        let err = create_error(
            ErrorKind::Timeout,
            "Timeout of 2000 ms exceeded",
            config,
            Some(ECONNABORTED),
            snapshot,
            None,
        );

        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(err.code.as_deref(), Some("ECONNABORTED"));
        assert_eq!(err.to_string(), "Timeout of 2000 ms exceeded");
        assert!(err.response.is_none());
    }

    #[test]
    fn test_rejection_predicates() {
        let config = config();
        let snapshot = HandleSnapshot::detached(&config);
        let network: Rejection =
            create_error(ErrorKind::Network, "Network Error", config, None, snapshot, None).into();
        assert_eq!(network.kind(), Some(ErrorKind::Network));
        assert!(!network.is_cancel());

        let cancelled: Rejection = Cancel::new("user navigated away").into();
        assert!(cancelled.is_cancel());
        assert_eq!(cancelled.kind(), None);
        assert_eq!(
            cancelled.cancel_reason().and_then(|c| c.message.as_deref()),
            Some("user navigated away")
        );
    }

    #[test]
    fn test_error_wraps_rejection() {
        let err: Error = Rejection::from(Cancel::new("stop")).into();
        assert!(err.is_cancel());
        assert!(!err.is_timeout());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_invalid_header_message() {
        let err = Error::invalid_header("bad name", "invalid HTTP header name");
        assert_eq!(
            err.to_string(),
            "Invalid header 'bad name': invalid HTTP header name"
        );
    }
}
