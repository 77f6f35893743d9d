//! Controller errors

use piconet_core::{CoreError, NodeIdentity};
use piconet_mesh::MeshError;
use thiserror::Error;

/// Errors raised while planning or tracking unit commands
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Unit is not registered with the controller
    #[error("Unknown unit: {0}")]
    UnknownUnit(NodeIdentity),

    /// Unit already registered
    #[error("Unit {0} already registered")]
    DuplicateUnit(NodeIdentity),

    /// Unit still has a command in flight
    #[error("Unit {0} is busy with a command in flight")]
    Busy(NodeIdentity),

    /// Ack arrived for a unit with nothing in flight
    #[error("Unexpected ack from {0}")]
    UnexpectedAck(NodeIdentity),

    /// Unit identity cannot be addressed on the wire
    #[error("Invalid unit identity: {0}")]
    InvalidIdentity(#[from] CoreError),

    /// Ack bytes did not decode
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}

/// Result type for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;
