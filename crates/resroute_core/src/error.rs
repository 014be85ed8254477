//! Error types for routing and dispatch.

use crate::route::Operation;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while routing and dispatching requests.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No route tree is installed.
    #[error("dispatcher not started: no route tree installed")]
    NotStarted,

    /// No segment matched the requested path.
    #[error("no route found for {path}")]
    NoRouteFound {
        /// The requested path.
        path: String,
    },

    /// A segment matched but does not handle the requested operation.
    #[error("no {operation} handler for {path}")]
    NoHandlerFound {
        /// The requested path.
        path: String,
        /// The operation that was requested.
        operation: Operation,
    },

    /// The matched handler failed.
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    /// Wraps a handler failure so it can be relayed to the caller.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }

    /// Returns true if this is a routing failure (no route or no handler).
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            CoreError::NoRouteFound { .. } | CoreError::NoHandlerFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::NoRouteFound {
            path: "/a/b".into(),
        };
        assert_eq!(err.to_string(), "no route found for /a/b");

        let err = CoreError::NoHandlerFound {
            path: "/a".into(),
            operation: Operation::Delete,
        };
        assert_eq!(err.to_string(), "no delete handler for /a");
        assert!(err.is_routing());

        let err = CoreError::handler("disk full");
        assert_eq!(err.to_string(), "handler failed: disk full");
        assert!(!err.is_routing());
        assert!(!CoreError::NotStarted.is_routing());
    }
}
