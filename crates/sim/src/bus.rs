//! In-memory radio bus
//!
//! Every simulated radio shares one [`RadioBus`]. Radio calls only record
//! intent; [`RadioBus::tick`] plays the air: it resolves connection attempts
//! and delivers scan results. Link traffic (writes, notifies, disconnects)
//! lands in the peer's inbox immediately. All radios are in range of each
//! other.

use piconet_core::ConnectionHandle;
use piconet_radio::{
    AdvType, AttributeHandle, MeshService, PeerAddress, Radio, RadioError, RadioEvent, RadioResult,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Attribute handle every simulated radio assigns to the command value
pub const SIM_COMMAND_ATTRIBUTE: AttributeHandle = AttributeHandle(0x0010);

/// Index of a radio on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A live link: `central` opened it to `peripheral`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimLink {
    /// The side that connected (parent, or the app)
    pub central: NodeId,
    /// The side that was connected to (child, or the root)
    pub peripheral: NodeId,
}

#[derive(Debug)]
struct Station {
    address: PeerAddress,
    powered: bool,
    advertising: Option<Vec<u8>>,
    scanning: bool,
    /// Advertisers already reported in the current scan
    seen: HashSet<NodeId>,
    attribute: Option<AttributeHandle>,
    connecting: Vec<PeerAddress>,
    inbox: VecDeque<RadioEvent>,
}

impl Station {
    fn new(address: PeerAddress) -> Self {
        Self {
            address,
            powered: true,
            advertising: None,
            scanning: false,
            seen: HashSet::new(),
            attribute: None,
            connecting: Vec::new(),
            inbox: VecDeque::new(),
        }
    }
}

#[derive(Debug)]
struct BusState {
    stations: Vec<Station>,
    links: BTreeMap<ConnectionHandle, SimLink>,
    next_handle: u16,
    rng: StdRng,
}

impl BusState {
    fn station(&mut self, id: NodeId) -> RadioResult<&mut Station> {
        match self.stations.get_mut(id.0) {
            Some(station) if station.powered => Ok(station),
            _ => Err(RadioError::Stack {
                status: -1,
                message: format!("{id} is powered off"),
            }),
        }
    }

    fn find(&self, address: &PeerAddress) -> Option<NodeId> {
        self.stations
            .iter()
            .position(|s| s.powered && &s.address == address)
            .map(NodeId)
    }

    fn push(&mut self, id: NodeId, event: RadioEvent) {
        if let Some(station) = self.stations.get_mut(id.0) {
            if station.powered {
                station.inbox.push_back(event);
            }
        }
    }

    fn allocate_handle(&mut self) -> ConnectionHandle {
        loop {
            let handle = ConnectionHandle(self.next_handle);
            self.next_handle = self.next_handle.wrapping_add(1);
            if handle.is_valid() && handle.0 != 0 && !self.links.contains_key(&handle) {
                return handle;
            }
        }
    }

    /// Tear a link down and tell both ends.
    fn drop_link(&mut self, handle: ConnectionHandle) -> Option<SimLink> {
        let link = self.links.remove(&handle)?;
        let central_addr = self.stations[link.central.0].address;
        let peripheral_addr = self.stations[link.peripheral.0].address;
        self.push(
            link.central,
            RadioEvent::OutboundDisconnected {
                handle,
                peer: peripheral_addr,
            },
        );
        self.push(
            link.peripheral,
            RadioEvent::InboundDisconnected {
                handle,
                peer: central_addr,
            },
        );
        Some(link)
    }

    fn resolve_connects(&mut self) -> usize {
        let mut resolved = 0;
        for index in 0..self.stations.len() {
            let central = NodeId(index);
            let attempts = std::mem::take(&mut self.stations[index].connecting);
            for peer in attempts {
                resolved += 1;
                let central_addr = self.stations[index].address;
                let target = self
                    .find(&peer)
                    .filter(|t| *t != central && self.stations[t.0].advertising.is_some());
                match target {
                    Some(peripheral) => {
                        let handle = self.allocate_handle();
                        self.links.insert(handle, SimLink { central, peripheral });
                        // A peripheral stops advertising once connected
                        self.stations[peripheral.0].advertising = None;
                        self.push(central, RadioEvent::OutboundConnected { handle, peer });
                        self.push(
                            peripheral,
                            RadioEvent::InboundConnected {
                                handle,
                                peer: central_addr,
                            },
                        );
                        tracing::debug!(%central, %peripheral, %handle, "Sim link up");
                    }
                    None => {
                        self.push(
                            central,
                            RadioEvent::OutboundDisconnected {
                                handle: ConnectionHandle::INVALID,
                                peer,
                            },
                        );
                        tracing::debug!(%central, %peer, "Sim connect failed");
                    }
                }
            }
        }
        resolved
    }

    fn deliver_scans(&mut self) -> usize {
        let mut delivered = 0;
        for index in 0..self.stations.len() {
            if !(self.stations[index].powered && self.stations[index].scanning) {
                continue;
            }
            let mut heard: Vec<NodeId> = (0..self.stations.len())
                .filter(|&other| {
                    other != index
                        && self.stations[other].powered
                        && self.stations[other].advertising.is_some()
                        && !self.stations[index].seen.contains(&NodeId(other))
                })
                .map(NodeId)
                .collect();
            heard.shuffle(&mut self.rng);

            for advertiser in heard {
                let adv_data = self.stations[advertiser.0].advertising.clone().unwrap_or_default();
                let peer = self.stations[advertiser.0].address;
                let rssi = -40 - (self.rng.next_u32() % 50) as i8;
                let scanner = &mut self.stations[index];
                scanner.seen.insert(advertiser);
                scanner.inbox.push_back(RadioEvent::ScanResult {
                    peer,
                    adv_type: AdvType::ConnectableUndirected,
                    rssi,
                    adv_data,
                });
                delivered += 1;
            }
        }
        delivered
    }
}

/// Shared air for any number of simulated radios
#[derive(Debug, Clone)]
pub struct RadioBus {
    inner: Arc<Mutex<BusState>>,
}

impl RadioBus {
    /// Empty bus; `seed` fixes the order in which scanners hear advertisers.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusState {
                stations: Vec::new(),
                links: BTreeMap::new(),
                next_handle: 1,
                rng: StdRng::seed_from_u64(seed),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a radio and return the handle its owner drives it through.
    pub fn attach(&self) -> SimRadio {
        let mut state = self.state();
        let index = state.stations.len();
        let [.., hi, lo] = (index as u64).to_be_bytes();
        let address = PeerAddress::public([0xC0, 0xFF, 0xEE, 0x00, hi, lo]);
        state.stations.push(Station::new(address));
        SimRadio {
            bus: self.clone(),
            id: NodeId(index),
        }
    }

    /// Play one round of the air. Returns how many connects resolved plus
    /// how many scan results went out.
    pub fn tick(&self) -> usize {
        let mut state = self.state();
        state.resolve_connects() + state.deliver_scans()
    }

    /// Next event waiting for `id`
    pub fn pop_event(&self, id: NodeId) -> Option<RadioEvent> {
        self.state()
            .stations
            .get_mut(id.0)
            .and_then(|s| s.inbox.pop_front())
    }

    /// Whether any inbox holds events or any connect is unresolved
    pub fn has_traffic(&self) -> bool {
        self.state()
            .stations
            .iter()
            .any(|s| !s.inbox.is_empty() || !s.connecting.is_empty())
    }

    /// Link-layer address of a station
    pub fn address(&self, id: NodeId) -> Option<PeerAddress> {
        self.state().stations.get(id.0).map(|s| s.address)
    }

    /// Whether a powered station is advertising
    pub fn is_advertising(&self, id: NodeId) -> bool {
        self.state()
            .stations
            .get(id.0)
            .map_or(false, |s| s.powered && s.advertising.is_some())
    }

    /// Whether a powered station is scanning
    pub fn is_scanning(&self, id: NodeId) -> bool {
        self.state()
            .stations
            .get(id.0)
            .map_or(false, |s| s.powered && s.scanning)
    }

    /// Snapshot of live links
    pub fn links(&self) -> Vec<(ConnectionHandle, SimLink)> {
        self.state().links.iter().map(|(h, l)| (*h, *l)).collect()
    }

    /// The radio that opened the link to `id`, if any
    pub fn central_of(&self, id: NodeId) -> Option<NodeId> {
        self.state()
            .links
            .values()
            .find(|l| l.peripheral == id)
            .map(|l| l.central)
    }

    /// Break one link, as if the peers drifted out of range.
    pub fn sever(&self, handle: ConnectionHandle) -> Option<SimLink> {
        self.state().drop_link(handle)
    }

    /// Switch a radio off: every link it holds drops and it goes silent.
    pub fn power_off(&self, id: NodeId) {
        let mut state = self.state();
        let handles: Vec<ConnectionHandle> = state
            .links
            .iter()
            .filter(|(_, l)| l.central == id || l.peripheral == id)
            .map(|(h, _)| *h)
            .collect();
        for handle in handles {
            state.drop_link(handle);
        }
        if let Some(station) = state.stations.get_mut(id.0) {
            station.powered = false;
            station.advertising = None;
            station.scanning = false;
            station.connecting.clear();
            station.inbox.clear();
        }
        tracing::info!(node = %id, "Sim radio powered off");
    }
}

/// One radio on a [`RadioBus`]
#[derive(Debug, Clone)]
pub struct SimRadio {
    bus: RadioBus,
    id: NodeId,
}

impl SimRadio {
    /// This radio's station
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The bus this radio is attached to
    pub fn bus(&self) -> &RadioBus {
        &self.bus
    }

    fn link_as(&self, state: &BusState, handle: ConnectionHandle, central: bool) -> RadioResult<SimLink> {
        state
            .links
            .get(&handle)
            .copied()
            .filter(|l| {
                if central {
                    l.central == self.id
                } else {
                    l.peripheral == self.id
                }
            })
            .ok_or(RadioError::NotConnected(handle))
    }
}

impl Radio for SimRadio {
    fn register_service(&mut self, _service: &MeshService) -> RadioResult<AttributeHandle> {
        let mut state = self.bus.state();
        state.station(self.id)?.attribute = Some(SIM_COMMAND_ATTRIBUTE);
        Ok(SIM_COMMAND_ATTRIBUTE)
    }

    fn advertise(&mut self, _interval_us: u32, payload: &[u8]) -> RadioResult<()> {
        let mut state = self.bus.state();
        state.station(self.id)?.advertising = Some(payload.to_vec());
        // Scanners hear a fresh advertising session as new
        let id = self.id;
        for station in &mut state.stations {
            station.seen.remove(&id);
        }
        Ok(())
    }

    fn stop_advertising(&mut self) -> RadioResult<()> {
        self.bus.state().station(self.id)?.advertising = None;
        Ok(())
    }

    fn start_scan(&mut self) -> RadioResult<()> {
        let mut state = self.bus.state();
        let station = state.station(self.id)?;
        station.scanning = true;
        station.seen.clear();
        Ok(())
    }

    fn stop_scan(&mut self) -> RadioResult<()> {
        let mut state = self.bus.state();
        state.station(self.id)?.scanning = false;
        state.push(self.id, RadioEvent::ScanDone);
        Ok(())
    }

    fn connect(&mut self, peer: PeerAddress) -> RadioResult<()> {
        let mut state = self.bus.state();
        let station = state.station(self.id)?;
        if station.connecting.contains(&peer) {
            return Err(RadioError::Busy(format!("already connecting to {peer}")));
        }
        station.connecting.push(peer);
        Ok(())
    }

    fn disconnect(&mut self, handle: ConnectionHandle) -> RadioResult<()> {
        let mut state = self.bus.state();
        let owned = state
            .links
            .get(&handle)
            .map_or(false, |l| l.central == self.id || l.peripheral == self.id);
        if !owned {
            return Err(RadioError::NotConnected(handle));
        }
        state.drop_link(handle);
        Ok(())
    }

    fn write(
        &mut self,
        handle: ConnectionHandle,
        attribute: AttributeHandle,
        data: &[u8],
    ) -> RadioResult<()> {
        let mut state = self.bus.state();
        let link = self.link_as(&state, handle, true)?;
        let peripheral = state.station(link.peripheral)?;
        if peripheral.attribute != Some(attribute) {
            return Err(RadioError::UnknownAttribute(attribute.0));
        }
        peripheral.inbox.push_back(RadioEvent::AttributeWritten {
            handle,
            attribute,
            data: data.to_vec(),
        });
        tracing::trace!(from = %self.id, to = %link.peripheral, bytes = %hex::encode(data), "Sim write");
        Ok(())
    }

    fn notify(
        &mut self,
        handle: ConnectionHandle,
        attribute: AttributeHandle,
        data: &[u8],
    ) -> RadioResult<()> {
        let mut state = self.bus.state();
        let link = self.link_as(&state, handle, false)?;
        state.push(
            link.central,
            RadioEvent::Notification {
                handle,
                attribute,
                data: data.to_vec(),
            },
        );
        Ok(())
    }
}
