//! Piconet Radio - the seam between the mesh protocol and the radio stack
//!
//! The link layer (connection setup, attribute reads and writes, advertising
//! and scanning schedules) is provided by the platform. This crate describes
//! it as a [`Radio`] trait the mesh drives, plus the [`RadioEvent`] stream the
//! stack delivers back, so the protocol can run against real hardware or the
//! in-memory simulator alike.

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod radio;
pub mod service;

pub use error::{RadioError, RadioResult};
pub use event::{AdvType, PeerAddress, RadioEvent};
pub use radio::{AttributeHandle, Radio};
pub use service::{
    CharacteristicFlags, MeshService, ServiceUuid, COMMAND_CHARACTERISTIC_UUID, MESH_SERVICE_UUID,
};
