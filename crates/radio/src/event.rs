//! Low-level events delivered by the radio stack.

use piconet_core::ConnectionHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::radio::AttributeHandle;

/// Link-layer address of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerAddress {
    /// Public (0) or random (1) address
    pub addr_type: u8,
    /// Six address bytes in radio order
    pub addr: [u8; 6],
}

impl PeerAddress {
    /// Public address
    pub fn public(addr: [u8; 6]) -> Self {
        Self { addr_type: 0, addr }
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", hex::encode(self.addr), self.addr_type)
    }
}

/// Advertising PDU type reported with a scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvType {
    /// ADV_IND: connectable, scannable, undirected
    ConnectableUndirected,
    /// ADV_DIRECT_IND: connectable, directed
    ConnectableDirected,
    /// ADV_SCAN_IND: scannable, not connectable
    ScannableUndirected,
    /// ADV_NONCONN_IND
    NonConnectable,
    /// SCAN_RSP
    ScanResponse,
    /// Anything the stack reports that is not listed above
    Unknown(u8),
}

impl AdvType {
    /// Whether a node advertising this way can be connected to as a child.
    pub fn is_connectable(self) -> bool {
        matches!(self, Self::ConnectableUndirected | Self::ConnectableDirected)
    }
}

impl From<u8> for AdvType {
    fn from(raw: u8) -> Self {
        match raw {
            0x00 => Self::ConnectableUndirected,
            0x01 => Self::ConnectableDirected,
            0x02 => Self::ScannableUndirected,
            0x03 => Self::NonConnectable,
            0x04 => Self::ScanResponse,
            other => Self::Unknown(other),
        }
    }
}

/// One event from the radio stack.
///
/// *Inbound* links are those a parent opened to this node (this node is the
/// peripheral); *outbound* links are those this node opened to a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// A parent connected to this node
    InboundConnected {
        /// New link handle
        handle: ConnectionHandle,
        /// Parent address
        peer: PeerAddress,
    },
    /// The link a parent opened went away
    InboundDisconnected {
        /// Link handle
        handle: ConnectionHandle,
        /// Parent address
        peer: PeerAddress,
    },
    /// A peer wrote to one of this node's attributes
    AttributeWritten {
        /// Link the write arrived on
        handle: ConnectionHandle,
        /// Attribute that was written
        attribute: AttributeHandle,
        /// Value carried by this write
        data: Vec<u8>,
    },
    /// An advertisement was heard while scanning
    ScanResult {
        /// Advertiser address
        peer: PeerAddress,
        /// PDU type
        adv_type: AdvType,
        /// Received signal strength
        rssi: i8,
        /// Raw advertising payload
        adv_data: Vec<u8>,
    },
    /// Scanning stopped
    ScanDone,
    /// An outbound connection to a child came up
    OutboundConnected {
        /// New link handle
        handle: ConnectionHandle,
        /// Child address
        peer: PeerAddress,
    },
    /// An outbound link dropped, or an outbound attempt failed
    /// (then `handle` is [`ConnectionHandle::INVALID`])
    OutboundDisconnected {
        /// Link handle
        handle: ConnectionHandle,
        /// Child address
        peer: PeerAddress,
    },
    /// A client write to a child finished
    WriteCompleted {
        /// Link handle
        handle: ConnectionHandle,
        /// Attribute written
        attribute: AttributeHandle,
        /// Stack status, 0 on success
        status: u16,
    },
    /// A child notified this node
    Notification {
        /// Link handle
        handle: ConnectionHandle,
        /// Attribute the notification refers to
        attribute: AttributeHandle,
        /// Notified bytes
        data: Vec<u8>,
    },
    /// MTU negotiated on a link
    MtuExchanged {
        /// Link handle
        handle: ConnectionHandle,
        /// Agreed MTU
        mtu: u16,
    },
    /// Any other stack event, by raw code
    Other(u8),
}

impl RadioEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InboundConnected { .. } => "inbound_connected",
            Self::InboundDisconnected { .. } => "inbound_disconnected",
            Self::AttributeWritten { .. } => "attribute_written",
            Self::ScanResult { .. } => "scan_result",
            Self::ScanDone => "scan_done",
            Self::OutboundConnected { .. } => "outbound_connected",
            Self::OutboundDisconnected { .. } => "outbound_disconnected",
            Self::WriteCompleted { .. } => "write_completed",
            Self::Notification { .. } => "notification",
            Self::MtuExchanged { .. } => "mtu_exchanged",
            Self::Other(_) => "other",
        }
    }
}
