//! Errors reported by the radio collaborator.

use piconet_core::ConnectionHandle;
use thiserror::Error;

/// Errors a [`Radio`](crate::Radio) implementation can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RadioError {
    /// The handle does not name a live link
    #[error("Not connected: {0}")]
    NotConnected(ConnectionHandle),

    /// The attribute handle is not registered
    #[error("Unknown attribute handle {0}")]
    UnknownAttribute(u16),

    /// The stack refused the operation in its current state
    #[error("Radio busy: {0}")]
    Busy(String),

    /// Any other stack failure, carrying the stack's status code
    #[error("Radio stack error (status {status}): {message}")]
    Stack {
        /// Platform status code
        status: i32,
        /// Human-readable context
        message: String,
    },
}

/// Result type for radio operations.
pub type RadioResult<T> = Result<T, RadioError>;
