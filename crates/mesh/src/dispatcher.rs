//! Event Dispatcher - the single entry point for radio events
//!
//! | event                  | handler                                        |
//! |------------------------|------------------------------------------------|
//! | inbound connected      | attach parent, re-plan discovery               |
//! | inbound disconnected   | detach parent, advertise again                 |
//! | attribute written      | read, validate, queue execute or forward       |
//! | scan result            | filter, maybe connect                          |
//! | outbound connected     | add child, re-plan discovery                   |
//! | outbound disconnected  | remove child or settle failed attempt          |
//! | notification           | validate, queue ack relay                      |
//!
//! Everything else is accepted and ignored. Handlers only touch the link set
//! and start or stop radio activity; motion and fan-out go through the
//! deferred queue.

use piconet_core::ConnectionHandle;
use piconet_radio::{PeerAddress, Radio, RadioEvent};

use crate::error::MeshError;
use crate::motion::MotionAdapter;
use crate::node::MeshNode;
use crate::packet::{AckNotification, CommandPacket};
use crate::queue::{Job, JobKind};
use crate::router::Route;

/// What the dispatcher did with one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Parent link recorded
    ParentAttached(ConnectionHandle),
    /// Second parent refused and disconnected
    ParentRejected(ConnectionHandle),
    /// Parent link cleared
    ParentDetached(ConnectionHandle),
    /// Child link recorded
    ChildAdded(ConnectionHandle),
    /// Child over capacity (or duplicate) refused and disconnected
    ChildRejected(ConnectionHandle),
    /// Child link cleared
    ChildRemoved(ConnectionHandle),
    /// Outbound attempt to this peer failed
    ConnectFailed(PeerAddress),
    /// Outbound attempt to this peer started
    Connecting(PeerAddress),
    /// Work queued for [`MeshNode::run_deferred`]
    Queued(JobKind),
    /// Input discarded
    Dropped {
        /// Why it was discarded
        reason: DropReason,
    },
    /// Event named a handle this node does not track
    Stale(ConnectionHandle),
    /// Event has no effect on mesh state
    Ignored,
}

/// Reason a command or ack was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Bytes did not decode
    Malformed,
    /// Deferred queue had no room
    QueueFull,
    /// The radio refused the connect
    Radio,
}

impl<M: MotionAdapter> MeshNode<M> {
    /// Handle one radio event. Never blocks and never fails; the returned
    /// [`Dispatch`] reports what happened.
    pub fn handle_event<R: Radio>(&mut self, event: RadioEvent, radio: &mut R) -> Dispatch {
        tracing::trace!(node = %self.identity, kind = event.kind(), "Radio event");
        match event {
            RadioEvent::InboundConnected { handle, peer } => self.on_inbound_connected(handle, peer, radio),
            RadioEvent::InboundDisconnected { handle, .. } => self.on_inbound_disconnected(handle, radio),
            RadioEvent::AttributeWritten {
                handle,
                attribute,
                data,
            } => {
                if attribute != self.command_attr {
                    return Dispatch::Ignored;
                }
                self.on_command_written(handle, &data)
            }
            RadioEvent::ScanResult { peer, .. } if self.parent_peer == Some(peer) => {
                // An orphaned parent advertising again; adopting it would close a loop
                tracing::debug!(node = %self.identity, %peer, "Ignoring own parent");
                Dispatch::Ignored
            }
            RadioEvent::ScanResult {
                peer,
                adv_type,
                adv_data,
                ..
            } => match self
                .discovery
                .consider(peer, adv_type, &adv_data, &self.links, radio)
            {
                Ok(true) => Dispatch::Connecting(peer),
                Ok(false) => Dispatch::Ignored,
                Err(e) => {
                    tracing::warn!(node = %self.identity, %peer, error = %e, "Connect attempt refused");
                    Dispatch::Dropped {
                        reason: DropReason::Radio,
                    }
                }
            },
            RadioEvent::OutboundConnected { handle, peer } => self.on_outbound_connected(handle, peer, radio),
            RadioEvent::OutboundDisconnected { handle, peer } => {
                self.on_outbound_disconnected(handle, peer, radio)
            }
            RadioEvent::Notification {
                handle,
                attribute,
                data,
            } => {
                if attribute != self.command_attr {
                    return Dispatch::Ignored;
                }
                self.on_notification(handle, &data)
            }
            RadioEvent::ScanDone
            | RadioEvent::WriteCompleted { .. }
            | RadioEvent::MtuExchanged { .. }
            | RadioEvent::Other(_) => Dispatch::Ignored,
        }
    }

    fn on_inbound_connected<R: Radio>(
        &mut self,
        handle: ConnectionHandle,
        peer: PeerAddress,
        radio: &mut R,
    ) -> Dispatch {
        match self.links.attach_parent(handle) {
            Ok(()) => {
                tracing::info!(node = %self.identity, %handle, %peer, "Parent attached");
                self.parent_peer = Some(peer);
                self.replan(radio);
                Dispatch::ParentAttached(handle)
            }
            Err(e) => {
                tracing::warn!(node = %self.identity, %handle, %peer, error = %e, "Rejecting inbound link");
                if let Err(e) = radio.disconnect(handle) {
                    tracing::warn!(node = %self.identity, %handle, error = %e, "Disconnect failed");
                }
                Dispatch::ParentRejected(handle)
            }
        }
    }

    fn on_inbound_disconnected<R: Radio>(&mut self, handle: ConnectionHandle, radio: &mut R) -> Dispatch {
        if !self.links.detach_parent(handle) {
            tracing::debug!(node = %self.identity, error = %MeshError::StaleHandle(handle), "Ignoring disconnect");
            return Dispatch::Stale(handle);
        }
        self.parent_peer = None;
        tracing::info!(
            node = %self.identity,
            %handle,
            children = self.links.child_count(),
            "Parent lost; advertising again"
        );
        self.replan(radio);
        Dispatch::ParentDetached(handle)
    }

    fn on_command_written(&mut self, handle: ConnectionHandle, bytes: &[u8]) -> Dispatch {
        if !self.links.is_parent(handle) {
            tracing::debug!(node = %self.identity, error = %MeshError::StaleHandle(handle), "Ignoring command write");
            return Dispatch::Stale(handle);
        }

        // Each write carries its own value; a later write never replaces one still queued
        let packet = match CommandPacket::decode(bytes) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(node = %self.identity, bytes = %hex::encode(bytes), error = %e, "Dropping command");
                return Dispatch::Dropped {
                    reason: DropReason::Malformed,
                };
            }
        };

        let job = match self.router.classify(&packet) {
            Route::Local => Job::Execute(packet),
            Route::Flood => Job::Forward(packet),
        };
        self.enqueue(job)
    }

    fn on_outbound_connected<R: Radio>(
        &mut self,
        handle: ConnectionHandle,
        peer: PeerAddress,
        radio: &mut R,
    ) -> Dispatch {
        self.discovery.settle(&peer);
        let dispatch = match self.links.add_child(handle) {
            Ok(()) => {
                tracing::info!(
                    node = %self.identity,
                    %handle,
                    %peer,
                    children = self.links.child_count(),
                    "Child attached"
                );
                Dispatch::ChildAdded(handle)
            }
            Err(e) => {
                tracing::warn!(node = %self.identity, %handle, %peer, error = %e, "Rejecting outbound link");
                if let Err(e) = radio.disconnect(handle) {
                    tracing::warn!(node = %self.identity, %handle, error = %e, "Disconnect failed");
                }
                Dispatch::ChildRejected(handle)
            }
        };
        self.replan(radio);
        dispatch
    }

    fn on_outbound_disconnected<R: Radio>(
        &mut self,
        handle: ConnectionHandle,
        peer: PeerAddress,
        radio: &mut R,
    ) -> Dispatch {
        let was_pending = self.discovery.settle(&peer);
        let dispatch = if handle.is_valid() && self.links.remove_child(handle) {
            tracing::info!(
                node = %self.identity,
                %handle,
                children = self.links.child_count(),
                "Child lost"
            );
            Dispatch::ChildRemoved(handle)
        } else if was_pending {
            tracing::info!(node = %self.identity, %peer, "Connect attempt failed");
            Dispatch::ConnectFailed(peer)
        } else {
            tracing::debug!(node = %self.identity, error = %MeshError::StaleHandle(handle), "Ignoring disconnect");
            return Dispatch::Stale(handle);
        };
        self.replan(radio);
        dispatch
    }

    fn on_notification(&mut self, handle: ConnectionHandle, data: &[u8]) -> Dispatch {
        if !self.links.is_child(handle) {
            tracing::debug!(node = %self.identity, error = %MeshError::StaleHandle(handle), "Ignoring notification");
            return Dispatch::Stale(handle);
        }
        match AckNotification::decode(data) {
            Ok(ack) => self.enqueue(Job::RelayAck(ack)),
            Err(e) => {
                tracing::warn!(node = %self.identity, %handle, bytes = %hex::encode(data), error = %e, "Dropping ack");
                Dispatch::Dropped {
                    reason: DropReason::Malformed,
                }
            }
        }
    }

    fn enqueue(&mut self, job: Job) -> Dispatch {
        let kind = job.kind();
        match self.queue.push(job) {
            Ok(()) => Dispatch::Queued(kind),
            Err(e) => {
                tracing::warn!(node = %self.identity, ?kind, error = %e, "Dropping job");
                Dispatch::Dropped {
                    reason: DropReason::QueueFull,
                }
            }
        }
    }

    fn replan<R: Radio>(&mut self, radio: &mut R) {
        // Failures are logged inside apply; the next link event retries
        self.discovery.apply(&self.links, radio).ok();
    }
}
