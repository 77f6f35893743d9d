//! Simulator errors

use piconet_core::NodeIdentity;
use piconet_mesh::MeshError;
use piconet_radio::RadioError;
use thiserror::Error;

use crate::bus::NodeId;

/// Errors raised while building or driving a simulated piconet
#[derive(Debug, Error)]
pub enum SimError {
    /// No node with this index
    #[error("Unknown node index {0}")]
    UnknownNode(NodeId),

    /// No node with this identity
    #[error("No node with identity {0}")]
    UnknownIdentity(NodeIdentity),

    /// The app has no link to a root node
    #[error("App is not connected to the piconet")]
    AppNotConnected,

    /// Network did not settle in the allotted steps
    #[error("Simulation still busy after {steps} steps")]
    NotSettled {
        /// Steps that were run
        steps: usize,
    },

    /// Node construction failed
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// Simulated radio refused an operation
    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),
}

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;
