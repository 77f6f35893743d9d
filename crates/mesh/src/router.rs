//! Command Router - addressing and forwarding down the tree
//!
//! Every command names its target. A node that matches runs the move and
//! acks toward the root; any other node floods the untouched bytes to all
//! of its children. Acks climb back up hop by hop on parent links.

use piconet_core::{ConnectionHandle, NodeIdentity};
use piconet_radio::{AttributeHandle, Radio};

use crate::link::LinkManager;
use crate::motion::{self, MotionAdapter};
use crate::packet::{AckNotification, CommandPacket, Maneuver};

/// Routing decision for one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Addressed to this node
    Local,
    /// Addressed elsewhere; flood to the subtree
    Flood,
}

/// Result of running one deferred job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Move performed; `acked` is false when there was no parent or the
    /// notify failed
    Executed {
        /// The move that ran
        maneuver: Maneuver,
        /// Whether an ack went up
        acked: bool,
    },
    /// Command written to children
    Forwarded {
        /// Children that took the write
        delivered: usize,
        /// Children whose write failed
        failed: Vec<ConnectionHandle>,
    },
    /// No children: the command ends here
    Absorbed,
    /// Child ack passed to our parent
    AckRelayed {
        /// The ack
        ack: AckNotification,
        /// Whether the notify succeeded
        delivered: bool,
    },
    /// Child ack reached a node with no parent
    AckDelivered(AckNotification),
}

/// Addressing and forwarding for one node
#[derive(Debug)]
pub struct CommandRouter {
    identity: NodeIdentity,
    attribute: AttributeHandle,
}

impl CommandRouter {
    /// Router for `identity`, using `attribute` for writes and notifies
    pub fn new(identity: NodeIdentity, attribute: AttributeHandle) -> Self {
        Self {
            identity,
            attribute,
        }
    }

    /// Identity commands are matched against
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Decide whether a command runs here or floods on
    pub fn classify(&self, packet: &CommandPacket) -> Route {
        if packet.is_for(&self.identity) {
            Route::Local
        } else {
            Route::Flood
        }
    }

    /// Run the move, then ack once on the parent link if there is one.
    pub fn execute<M, R>(
        &self,
        packet: &CommandPacket,
        motion: &mut M,
        links: &mut LinkManager,
        radio: &mut R,
    ) -> Outcome
    where
        M: MotionAdapter + ?Sized,
        R: Radio,
    {
        let maneuver = *packet.maneuver();
        tracing::info!(node = %self.identity, %maneuver, "Executing command");
        motion::perform(motion, &maneuver);

        let acked = match links.parent() {
            Some(parent) => {
                let ack = AckNotification::new(self.identity.clone());
                self.notify_parent(parent, &ack.to_bytes(), links, radio)
            }
            None => {
                tracing::debug!(node = %self.identity, "No parent; ack not propagated");
                false
            }
        };
        Outcome::Executed { maneuver, acked }
    }

    /// Write the packet bytes, unchanged, to every current child.
    pub fn forward<R: Radio>(
        &self,
        packet: &CommandPacket,
        links: &mut LinkManager,
        radio: &mut R,
    ) -> Outcome {
        let children = links.children_snapshot();
        if children.is_empty() {
            tracing::debug!(
                node = %self.identity,
                target = %packet.target(),
                "No children; command absorbed"
            );
            return Outcome::Absorbed;
        }

        let mut delivered = 0;
        let mut failed = Vec::new();
        for child in children {
            match radio.write(child, self.attribute, packet.as_bytes()) {
                Ok(()) => {
                    links.mark_alive(child, true);
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!(node = %self.identity, handle = %child, error = %e, "Forward failed");
                    links.mark_alive(child, false);
                    failed.push(child);
                }
            }
        }
        tracing::debug!(
            node = %self.identity,
            target = %packet.target(),
            bytes = %hex::encode(packet.as_bytes()),
            delivered,
            "Command flooded to children"
        );
        Outcome::Forwarded { delivered, failed }
    }

    /// Pass a child's ack to our parent, or surface it if we have none.
    pub fn relay_ack<R: Radio>(
        &self,
        ack: AckNotification,
        links: &mut LinkManager,
        radio: &mut R,
    ) -> Outcome {
        match links.parent() {
            Some(parent) => {
                let delivered = self.notify_parent(parent, &ack.to_bytes(), links, radio);
                Outcome::AckRelayed { ack, delivered }
            }
            None => {
                tracing::info!(node = %self.identity, sender = %ack.sender, "Ack reached sub-tree root");
                Outcome::AckDelivered(ack)
            }
        }
    }

    fn notify_parent<R: Radio>(
        &self,
        parent: ConnectionHandle,
        data: &[u8],
        links: &mut LinkManager,
        radio: &mut R,
    ) -> bool {
        match radio.notify(parent, self.attribute, data) {
            Ok(()) => {
                links.mark_alive(parent, true);
                true
            }
            Err(e) => {
                tracing::warn!(node = %self.identity, handle = %parent, error = %e, "Notify to parent failed");
                links.mark_alive(parent, false);
                false
            }
        }
    }
}
