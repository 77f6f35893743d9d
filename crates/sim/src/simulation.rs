//! Many mesh nodes on one bus, plus the app that steers the root
//!
//! [`Simulation::step`] is the cooperative loop every real node runs, done
//! for all nodes at once: play the air, hand each node its events, then run
//! each node's deferred work.

use piconet_core::{Config, ConnectionHandle, NodeIdentity};
use piconet_mesh::{AckNotification, CommandPacket, MeshNode, Outcome};
use piconet_radio::{Radio, RadioEvent};

use crate::bus::{NodeId, RadioBus, SimRadio, SIM_COMMAND_ATTRIBUTE};
use crate::error::{SimError, SimResult};
use crate::motion::RecordingMotion;

/// Steps [`Simulation::settle`] allows before giving up
pub const DEFAULT_SETTLE_STEPS: usize = 256;

struct SimNode {
    node: MeshNode<RecordingMotion>,
    radio: SimRadio,
    online: bool,
}

/// A simulated piconet
pub struct Simulation {
    bus: RadioBus,
    nodes: Vec<SimNode>,
    app: SimRadio,
    app_link: Option<ConnectionHandle>,
    app_acks: Vec<Vec<u8>>,
    surfaced: Vec<(NodeIdentity, AckNotification)>,
}

impl Simulation {
    /// Empty piconet; `seed` fixes scan ordering.
    pub fn new(seed: u64) -> Self {
        let bus = RadioBus::new(seed);
        let app = bus.attach();
        Self {
            bus,
            nodes: Vec::new(),
            app,
            app_link: None,
            app_acks: Vec::new(),
            surfaced: Vec::new(),
        }
    }

    /// The shared air
    pub fn bus(&self) -> &RadioBus {
        &self.bus
    }

    /// Power up a node. It starts advertising right away.
    pub fn add_node(&mut self, config: &Config) -> SimResult<NodeId> {
        let mut radio = self.bus.attach();
        let node = MeshNode::new(config, RecordingMotion::default(), &mut radio)?;
        let id = radio.id();
        tracing::debug!(node = %node.identity(), sim_id = %id, "Sim node added");
        self.nodes.push(SimNode {
            node,
            radio,
            online: true,
        });
        Ok(id)
    }

    /// Power up one default-configured node per identity.
    pub fn add_nodes<I>(&mut self, identities: I) -> SimResult<Vec<NodeId>>
    where
        I: IntoIterator<Item = NodeIdentity>,
    {
        identities
            .into_iter()
            .map(|identity| self.add_node(&Config::for_node(identity)))
            .collect()
    }

    fn slot(&self, id: NodeId) -> SimResult<&SimNode> {
        self.nodes
            .iter()
            .find(|n| n.radio.id() == id)
            .ok_or(SimError::UnknownNode(id))
    }

    /// Mesh state of one node
    pub fn node(&self, id: NodeId) -> SimResult<&MeshNode<RecordingMotion>> {
        self.slot(id).map(|n| &n.node)
    }

    /// All nodes, in the order they were added
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.radio.id()).collect()
    }

    /// Find a node by identity
    pub fn find(&self, identity: &NodeIdentity) -> SimResult<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.node.identity() == identity)
            .map(|n| n.radio.id())
            .ok_or_else(|| SimError::UnknownIdentity(identity.clone()))
    }

    /// Node whose radio opened the link to `id`; `None` for the root and
    /// for orphans.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.bus
            .central_of(id)
            .filter(|central| *central != self.app.id())
    }

    /// Hops from the app to `id`, if `id` is in the app's tree
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        let mut depth = 1;
        let mut current = id;
        loop {
            let central = self.bus.central_of(current)?;
            if central == self.app.id() {
                return Some(depth);
            }
            current = central;
            depth += 1;
            if depth > self.nodes.len() {
                return None;
            }
        }
    }

    /// Have the app connect to `root`. Completes on the next [`step`](Self::step).
    pub fn connect_app(&mut self, root: NodeId) -> SimResult<()> {
        let address = self.bus.address(root).ok_or(SimError::UnknownNode(root))?;
        self.app.connect(address)?;
        Ok(())
    }

    /// Whether the app holds a link to the root
    pub fn app_connected(&self) -> bool {
        self.app_link.is_some()
    }

    /// Write a command to the root, as the app does.
    pub fn send_command(&mut self, packet: &CommandPacket) -> SimResult<()> {
        let link = self.app_link.ok_or(SimError::AppNotConnected)?;
        self.app.write(link, SIM_COMMAND_ATTRIBUTE, packet.as_bytes())?;
        Ok(())
    }

    /// Ack bytes the root has notified to the app since the last call
    pub fn take_app_acks(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.app_acks)
    }

    /// Acks that reached a node with no parent, with that node's identity
    pub fn take_surfaced_acks(&mut self) -> Vec<(NodeIdentity, AckNotification)> {
        std::mem::take(&mut self.surfaced)
    }

    /// Switch a node off; its peers see their links drop.
    pub fn power_off(&mut self, id: NodeId) -> SimResult<()> {
        let slot = self
            .nodes
            .iter_mut()
            .find(|n| n.radio.id() == id)
            .ok_or(SimError::UnknownNode(id))?;
        slot.online = false;
        self.bus.power_off(id);
        Ok(())
    }

    /// One round. Returns the amount of activity; zero means quiet.
    pub fn step(&mut self) -> usize {
        let mut activity = self.bus.tick();

        while let Some(event) = self.bus.pop_event(self.app.id()) {
            activity += 1;
            self.on_app_event(event);
        }

        for slot in self.nodes.iter_mut().filter(|n| n.online) {
            while let Some(event) = self.bus.pop_event(slot.radio.id()) {
                activity += 1;
                slot.node.handle_event(event, &mut slot.radio);
            }
            for outcome in slot.node.run_deferred(&mut slot.radio) {
                activity += 1;
                if let Outcome::AckDelivered(ack) = outcome {
                    self.surfaced.push((slot.node.identity().clone(), ack));
                }
            }
        }
        activity
    }

    /// Step until nothing happens, up to `max_steps`.
    pub fn settle_within(&mut self, max_steps: usize) -> SimResult<usize> {
        for steps in 1..=max_steps {
            if self.step() == 0 && !self.bus.has_traffic() {
                return Ok(steps);
            }
        }
        Err(SimError::NotSettled { steps: max_steps })
    }

    /// [`settle_within`](Self::settle_within) with [`DEFAULT_SETTLE_STEPS`]
    pub fn settle(&mut self) -> SimResult<usize> {
        self.settle_within(DEFAULT_SETTLE_STEPS)
    }

    fn on_app_event(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::OutboundConnected { handle, peer } => {
                tracing::info!(%handle, %peer, "App connected to root");
                self.app_link = Some(handle);
            }
            RadioEvent::OutboundDisconnected { handle, peer } => {
                if self.app_link == Some(handle) {
                    tracing::warn!(%handle, %peer, "App lost the root");
                    self.app_link = None;
                }
            }
            RadioEvent::Notification { data, .. } => {
                tracing::info!(bytes = %hex::encode(&data), "App received ack");
                self.app_acks.push(data);
            }
            other => tracing::trace!(kind = other.kind(), "App ignoring event"),
        }
    }
}
