//! Error types for piconet mesh operations.
//!
//! None of these are fatal: the node logs them and keeps running through
//! link churn and bad input.

use piconet_core::{ConnectionHandle, CoreError};
use piconet_radio::RadioError;
use thiserror::Error;

/// Errors that can occur in mesh operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Advertising payload would not fit the advertising PDU
    #[error("Advertising payload too large: {size} bytes exceeds {limit}")]
    PayloadTooLarge {
        /// Encoded size that was attempted
        size: usize,
        /// Maximum allowed size
        limit: usize,
    },

    /// No room for another child link
    #[error("Child capacity {capacity} reached")]
    AtCapacity {
        /// Configured capacity
        capacity: usize,
    },

    /// A parent link already exists
    #[error("Already attached to parent {existing}")]
    AlreadyHasParent {
        /// Handle of the parent that is kept
        existing: ConnectionHandle,
    },

    /// Handle is already tracked in the link set
    #[error("Handle {0} already tracked")]
    DuplicateHandle(ConnectionHandle),

    /// Command or ack payload could not be decoded
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Advertising payload could not be decoded
    #[error("Malformed advertisement: {0}")]
    MalformedAdvertisement(String),

    /// Event refers to a handle that is not tracked
    #[error("Stale handle event for {0}")]
    StaleHandle(ConnectionHandle),

    /// Deferred work queue is full
    #[error("Deferred queue full ({depth} jobs)")]
    QueueFull {
        /// Queue depth
        depth: usize,
    },

    /// Identity errors from the core crate
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Radio collaborator errors
    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;
