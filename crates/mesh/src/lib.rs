//! Piconet Mesh - self-organizing control tree over short-range radio
//!
//! Each node takes at most one parent (the link a coordinator opened to it)
//! and recruits up to a fixed number of children by scanning for other
//! members' advertisements. Commands name their target and flood down the
//! tree; the target moves and an ack climbs back up hop by hop.
//!
//! # Core Components
//!
//! - **Link Manager**: the one optional parent and the bounded child set
//! - **Discovery Controller**: advertise while orphaned, scan while recruiting
//! - **Advertising codec**: TLV payload encode, decode and candidate filter
//! - **Command Router**: execute-or-flood and ack relay
//! - **Event Dispatcher**: radio events in, link bookkeeping and queued work out
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use piconet_core::{Config, NodeIdentity};
//! use piconet_mesh::{MeshNode, MotionAdapter};
//! # use piconet_radio::Radio;
//!
//! struct Wheels;
//!
//! impl MotionAdapter for Wheels {
//!     fn turn(&mut self, _degrees: i16) {}
//!     fn straight(&mut self, _distance_cm: u32) {}
//! }
//!
//! # fn run<R: Radio>(radio: &mut R, events: Vec<piconet_radio::RadioEvent>) -> Result<(), piconet_mesh::MeshError> {
//! let config = Config::for_node(NodeIdentity::Number(3));
//! let mut node = MeshNode::new(&config, Wheels, radio)?;
//!
//! for event in events {
//!     node.handle_event(event, radio);
//!     node.run_deferred(radio);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod advertising;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod link;
pub mod motion;
pub mod node;
pub mod packet;
pub mod queue;
pub mod router;

// Re-export main types
pub use advertising::{is_mesh_candidate, AdvertisingData, ADV_MAX_PAYLOAD};
pub use discovery::{DiscoveryController, DiscoveryState};
pub use dispatcher::{Dispatch, DropReason};
pub use error::{MeshError, MeshResult};
pub use link::{LinkManager, LinkRecord, LinkRole};
pub use motion::MotionAdapter;
pub use node::MeshNode;
pub use packet::{AckNotification, CommandPacket, Maneuver, TurnDirection};
pub use queue::{Job, JobKind, DEFERRED_QUEUE_DEPTH};
pub use router::{CommandRouter, Outcome, Route};
