//! Mesh Node - one explicit owned instance per radio
//!
//! Bundles the link set, discovery, routing and the deferred queue with the
//! node's drivetrain. Radio events go in through
//! [`handle_event`](MeshNode::handle_event); the slow half runs in
//! [`run_deferred`](MeshNode::run_deferred).

use piconet_core::{Config, NodeIdentity};
use piconet_radio::{AttributeHandle, MeshService, PeerAddress, Radio};

use crate::advertising::AdvertisingData;
use crate::discovery::{DiscoveryController, DiscoveryState};
use crate::error::MeshResult;
use crate::link::LinkManager;
use crate::motion::MotionAdapter;
use crate::queue::{DeferredQueue, Job};
use crate::router::{CommandRouter, Outcome};

/// A single piconet node
#[derive(Debug)]
pub struct MeshNode<M: MotionAdapter> {
    pub(crate) identity: NodeIdentity,
    pub(crate) links: LinkManager,
    /// Address behind the parent link, while there is one
    pub(crate) parent_peer: Option<PeerAddress>,
    pub(crate) discovery: DiscoveryController,
    pub(crate) router: CommandRouter,
    pub(crate) queue: DeferredQueue,
    pub(crate) motion: M,
    pub(crate) command_attr: AttributeHandle,
}

impl<M: MotionAdapter> MeshNode<M> {
    /// Register the mesh service and start discovery.
    ///
    /// A radio that refuses the service registration is an error. An
    /// advertisement that does not fit, or a radio that refuses to start
    /// advertising, is only logged: the node stays up and retries discovery
    /// on the next link event.
    pub fn new<R: Radio>(config: &Config, motion: M, radio: &mut R) -> MeshResult<Self> {
        config.validate()?;

        let service = MeshService::standard();
        let command_attr = radio.register_service(&service)?;

        let identity = config.node.identity.clone();
        let mut advertising = AdvertisingData::for_node(identity.to_string(), service.advertised_uuid());
        if config.radio.appearance != 0 {
            advertising = advertising.with_appearance(config.radio.appearance);
        }

        let mut node = Self {
            links: LinkManager::with_capacity(config.node.child_capacity),
            parent_peer: None,
            discovery: DiscoveryController::new(
                &advertising,
                service.advertised_uuid(),
                config.node.accepts_children,
                config.radio.advertise_interval_us,
            ),
            router: CommandRouter::new(identity.clone(), command_attr),
            queue: DeferredQueue::default(),
            identity,
            motion,
            command_attr,
        };

        if let Err(e) = node.discovery.apply(&node.links, radio) {
            tracing::warn!(node = %node.identity, error = %e, "Initial discovery start failed");
        }
        tracing::info!(
            node = %node.identity,
            accepts_children = config.node.accepts_children,
            capacity = node.links.capacity(),
            state = ?node.discovery.state(),
            "Mesh node started"
        );
        Ok(node)
    }

    /// This node's identity
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Parent and child links
    pub fn links(&self) -> &LinkManager {
        &self.links
    }

    /// Current discovery mode
    pub fn discovery_state(&self) -> DiscoveryState {
        self.discovery.state()
    }

    /// Attribute handle the mesh service registered for commands
    pub fn command_attribute(&self) -> AttributeHandle {
        self.command_attr
    }

    /// Jobs waiting for [`run_deferred`](Self::run_deferred)
    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    /// The drivetrain
    pub fn motion(&self) -> &M {
        &self.motion
    }

    /// The drivetrain, mutably
    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    /// Drain the deferred queue, returning one outcome per job in FIFO order.
    pub fn run_deferred<R: Radio>(&mut self, radio: &mut R) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(self.queue.len());
        while let Some(job) = self.queue.pop() {
            let outcome = match job {
                Job::Execute(packet) => {
                    self.router
                        .execute(&packet, &mut self.motion, &mut self.links, radio)
                }
                Job::Forward(packet) => self.router.forward(&packet, &mut self.links, radio),
                Job::RelayAck(ack) => self.router.relay_ack(ack, &mut self.links, radio),
            };
            tracing::trace!(node = %self.identity, ?outcome, "Deferred job done");
            outcomes.push(outcome);
        }
        outcomes
    }
}
