//! The radio collaborator trait.

use piconet_core::ConnectionHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RadioResult;
use crate::event::PeerAddress;
use crate::service::MeshService;

/// Handle of a registered attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeHandle(pub u16);

impl fmt::Display for AttributeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attr:{}", self.0)
    }
}

/// Operations the mesh needs from the radio stack.
///
/// Implementations must not call back into the mesh from inside these
/// methods; events are delivered separately, one at a time.
pub trait Radio {
    /// Register the mesh service, returning the command attribute handle.
    fn register_service(&mut self, service: &MeshService) -> RadioResult<AttributeHandle>;

    /// Start advertising `payload` every `interval_us` microseconds.
    fn advertise(&mut self, interval_us: u32, payload: &[u8]) -> RadioResult<()>;

    /// Stop advertising.
    fn stop_advertising(&mut self) -> RadioResult<()>;

    /// Scan until told to stop.
    fn start_scan(&mut self) -> RadioResult<()>;

    /// Stop scanning.
    fn stop_scan(&mut self) -> RadioResult<()>;

    /// Open an outbound connection; the outcome arrives as an event.
    fn connect(&mut self, peer: PeerAddress) -> RadioResult<()>;

    /// Close a link this node does not want to keep.
    fn disconnect(&mut self, handle: ConnectionHandle) -> RadioResult<()>;

    /// Write `data` to the peer's attribute over an outbound link.
    fn write(
        &mut self,
        handle: ConnectionHandle,
        attribute: AttributeHandle,
        data: &[u8],
    ) -> RadioResult<()>;

    /// Notify the peer on an inbound link.
    fn notify(
        &mut self,
        handle: ConnectionHandle,
        attribute: AttributeHandle,
        data: &[u8],
    ) -> RadioResult<()>;
}
