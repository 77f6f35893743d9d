//! Discovery Controller - advertise to find a parent, scan to find children
//!
//! The radio can usefully do only one of the two at a time, so the wanted
//! mode is derived from the link set alone:
//!
//! | parent | accepts children | children + pending   | state         |
//! |--------|------------------|----------------------|---------------|
//! | no     | -                | -                    | `Advertising` |
//! | yes    | no               | -                    | `Attached`    |
//! | yes    | yes              | `< capacity`         | `Scanning`    |
//! | yes    | yes              | `== capacity`        | `Full`        |
//!
//! A node that loses its parent keeps its children and advertises again.

use piconet_radio::{AdvType, PeerAddress, Radio, ServiceUuid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::advertising::{is_mesh_candidate, AdvertisingData};
use crate::error::MeshResult;
use crate::link::LinkManager;

/// Discovery mode of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryState {
    /// No parent and nothing to advertise (the payload failed to encode)
    Idle,
    /// No parent; advertising the mesh service
    Advertising,
    /// Parent acquired; not recruiting children
    Attached,
    /// Parent acquired; scanning for children
    Scanning,
    /// Parent acquired; child capacity committed
    Full,
}

/// Drives advertising and scanning from link-set observations
#[derive(Debug)]
pub struct DiscoveryController {
    state: DiscoveryState,
    accepts_children: bool,
    service: ServiceUuid,
    advertisement: Option<Vec<u8>>,
    advertise_interval_us: u32,
    /// Outbound connection attempts not yet settled by a link event
    pending: BTreeSet<PeerAddress>,
}

impl DiscoveryController {
    /// Encode the advertisement once; a node whose payload does not encode
    /// never advertises.
    pub fn new(
        advertising: &AdvertisingData,
        service: ServiceUuid,
        accepts_children: bool,
        advertise_interval_us: u32,
    ) -> Self {
        let advertisement = match advertising.encode() {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::error!(error = %e, "Advertising payload rejected; node will not advertise");
                None
            }
        };
        Self {
            state: DiscoveryState::Idle,
            accepts_children,
            service,
            advertisement,
            advertise_interval_us,
            pending: BTreeSet::new(),
        }
    }

    /// Current discovery mode
    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Encoded advertisement, if it fit
    pub fn advertisement(&self) -> Option<&[u8]> {
        self.advertisement.as_deref()
    }

    /// Number of outbound connection attempts in flight
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// State the node should be in for the given links.
    pub fn desired_state(&self, links: &LinkManager) -> DiscoveryState {
        if !links.has_parent() {
            return if self.advertisement.is_some() {
                DiscoveryState::Advertising
            } else {
                DiscoveryState::Idle
            };
        }
        if !self.accepts_children {
            return DiscoveryState::Attached;
        }
        if links.child_count() + self.pending.len() >= links.capacity() {
            DiscoveryState::Full
        } else {
            DiscoveryState::Scanning
        }
    }

    /// Move the radio into the desired state.
    ///
    /// On a failed start the controller settles in the passive state
    /// (`Idle` or `Attached`) so the next call retries.
    pub fn apply<R: Radio>(&mut self, links: &LinkManager, radio: &mut R) -> MeshResult<DiscoveryState> {
        let target = self.desired_state(links);
        if target == self.state {
            return Ok(self.state);
        }

        match self.state {
            DiscoveryState::Advertising => {
                if let Err(e) = radio.stop_advertising() {
                    tracing::warn!(error = %e, "Failed to stop advertising");
                }
            }
            DiscoveryState::Scanning => {
                if let Err(e) = radio.stop_scan() {
                    tracing::warn!(error = %e, "Failed to stop scanning");
                }
            }
            _ => {}
        }

        let result = match (target, self.advertisement.as_deref()) {
            (DiscoveryState::Advertising, Some(payload)) => radio
                .advertise(self.advertise_interval_us, payload)
                .map_err(|e| (DiscoveryState::Idle, e)),
            (DiscoveryState::Scanning, _) => radio
                .start_scan()
                .map_err(|e| (DiscoveryState::Attached, e)),
            _ => Ok(()),
        };

        let previous = self.state;
        match result {
            Ok(()) => {
                self.state = target;
                tracing::debug!(from = ?previous, to = ?target, "Discovery state changed");
                Ok(target)
            }
            Err((fallback, e)) => {
                self.state = fallback;
                tracing::warn!(wanted = ?target, now = ?fallback, error = %e, "Discovery transition failed");
                Err(e.into())
            }
        }
    }

    /// Act on one scan result. Returns whether a connection was initiated.
    pub fn consider<R: Radio>(
        &mut self,
        peer: PeerAddress,
        adv_type: AdvType,
        adv_data: &[u8],
        links: &LinkManager,
        radio: &mut R,
    ) -> MeshResult<bool> {
        if self.state != DiscoveryState::Scanning || self.pending.contains(&peer) {
            return Ok(false);
        }
        if !is_mesh_candidate(adv_type, adv_data, &self.service) {
            return Ok(false);
        }
        if links.child_count() + self.pending.len() >= links.capacity() {
            return Ok(false);
        }

        radio.connect(peer)?;
        self.pending.insert(peer);
        tracing::info!(%peer, pending = self.pending.len(), "Connecting to mesh candidate");

        // Stop scanning as soon as capacity is committed; a failed stop is
        // logged by apply and retried on the next link event
        self.apply(links, radio).ok();
        Ok(true)
    }

    /// Clear a pending attempt once the radio reports its outcome.
    pub fn settle(&mut self, peer: &PeerAddress) -> bool {
        self.pending.remove(peer)
    }
}
