//! Error types for the sync orchestrator.

use std::fmt;
use thiserror::Error;

/// Result type for one fetch or apply unit.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors reported by an [`Http`](crate::Http) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The request could not be formed.
    #[error("bad request: {message}")]
    BadRequest {
        /// What was wrong.
        message: String,
    },

    /// The request failed. Status 0 means the host was unreachable.
    #[error("http {status} {description}: {message}")]
    Other {
        /// HTTP status code, or 0 when no response arrived.
        status: u16,
        /// Short status description.
        description: String,
        /// Detail message.
        message: String,
    },
}

impl HttpError {
    /// Creates an error for a response with `status`.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        let description = match status {
            0 => "Unreachable",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            408 => "Request Timeout",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Error",
        };
        Self::Other {
            status,
            description: description.to_string(),
            message: message.into(),
        }
    }

    /// Creates an error for an unreachable host.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::status(0, message)
    }

    /// Returns the failure class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            HttpError::BadRequest { .. } => ErrorClass::Other,
            HttpError::Other { status, .. } => match status {
                401 | 403 => ErrorClass::Authentication,
                0 | 408 | 502 | 503 | 504 => ErrorClass::Network,
                _ => ErrorClass::Other,
            },
        }
    }
}

/// Failure classes counted by a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Credentials were missing or rejected.
    Authentication,
    /// The remote could not be reached or timed out.
    Network,
    /// Anything else.
    Other,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Authentication => "authentication",
            ErrorClass::Network => "network",
            ErrorClass::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors from one unit of a sync pass.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The remote request failed.
    #[error("remote fetch failed: {0}")]
    Http(#[from] HttpError),

    /// The remote payload had an unexpected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The local store failed.
    #[error("local store error: {0}")]
    Local(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The worker running the unit panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl FetchError {
    /// Wraps a local store error.
    pub fn local<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Local(Box::new(error))
    }

    /// Returns the failure class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            FetchError::Http(err) => err.class(),
            _ => ErrorClass::Other,
        }
    }
}

/// Errors constructing a [`SyncOrchestrator`](crate::SyncOrchestrator).
#[derive(Error, Debug)]
pub enum SyncError {
    /// The worker runtime could not be built.
    #[error("failed to build sync runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(
            HttpError::status(401, "no key").class(),
            ErrorClass::Authentication
        );
        assert_eq!(
            HttpError::status(403, "bad key").class(),
            ErrorClass::Authentication
        );
        for status in [0, 408, 502, 503, 504] {
            assert_eq!(HttpError::status(status, "").class(), ErrorClass::Network);
        }
        assert_eq!(HttpError::status(404, "").class(), ErrorClass::Other);
        assert_eq!(HttpError::status(500, "").class(), ErrorClass::Other);
        assert_eq!(
            HttpError::BadRequest {
                message: "empty url".into()
            }
            .class(),
            ErrorClass::Other
        );
    }

    #[test]
    fn fetch_error_class() {
        let err: FetchError = HttpError::unreachable("offline").into();
        assert_eq!(err.class(), ErrorClass::Network);
        assert_eq!(FetchError::Decode("no data".into()).class(), ErrorClass::Other);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(FetchError::local(io).class(), ErrorClass::Other);
    }

    #[test]
    fn display() {
        assert_eq!(
            HttpError::status(503, "try later").to_string(),
            "http 503 Service Unavailable: try later"
        );
    }
}
