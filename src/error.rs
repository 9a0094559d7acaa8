//! # Dispatch Error Types
//!
//! Structured error handling for the dispatch engine using thiserror
//! for typed error variants instead of `Box<dyn Error>` patterns.
//!
//! Every caller-facing failure is returned as a `Result`; nothing in the
//! engine panics across the public boundary. Best-effort operations
//! (`cancel_task`, `stop_flow`) are silent no-ops on missing keys and have
//! no error variants here.

use crate::messaging::Method;
use thiserror::Error;

/// Errors surfaced by the public dispatcher operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No handler is registered for the message's method code.
    /// Rejected synchronously at `push` time with no side effects.
    #[error("unknown method: {method}")]
    UnknownMethod { method: Method },

    /// `wait` referenced a flow key that has never been pushed to, or that
    /// was already stopped and evicted. A caller error, not transient.
    #[error("flow not found: {flow_key}")]
    FlowNotFound { flow_key: String },

    /// `wait` was called with a non-positive timeout.
    #[error("timeout must be greater than 0, got {timeout_ms}")]
    InvalidTimeout { timeout_ms: i64 },

    /// The `wait` timeout elapsed before any result became available.
    /// The underlying tasks keep running; only the wait gave up.
    #[error("timeout waiting for task completion after {timeout_ms}ms")]
    WaitTimeout { timeout_ms: i64 },

    /// The flow was stopped while a `wait` on it was pending.
    #[error("flow stopped: {flow_key}")]
    FlowStopped { flow_key: String },

    /// The flow's result channel closed without a value.
    #[error("result channel closed")]
    ChannelClosed,

    /// The dispatcher was destroyed while a `wait` was pending.
    #[error("dispatcher destroyed")]
    Destroyed,

    /// A result could not be serialized to its wire shape.
    #[error("result serialization failed: {message}")]
    Serialization { message: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DispatchError::UnknownMethod { method: Method(42) };
        assert_eq!(err.to_string(), "unknown method: 42");

        let err = DispatchError::FlowNotFound {
            flow_key: "f1".to_string(),
        };
        assert_eq!(err.to_string(), "flow not found: f1");

        let err = DispatchError::InvalidTimeout { timeout_ms: -5 };
        assert!(err.to_string().contains("greater than 0"));
    }
}
