//! Advertising payload codec and scan-result filter
//!
//! An advertisement is a sequence of `[length][type][data]` records where
//! `length` counts the type byte plus the data. The whole payload must fit
//! in [`ADV_MAX_PAYLOAD`] bytes; encoding fails rather than truncating.

use piconet_radio::{AdvType, ServiceUuid};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// Largest legacy advertising payload
pub const ADV_MAX_PAYLOAD: usize = 31;

/// Advertising record type codes
pub mod record_type {
    /// Discoverability flags
    pub const FLAGS: u8 = 0x01;
    /// Incomplete list of 16-bit service identifiers
    pub const UUID16_MORE: u8 = 0x02;
    /// Complete list of 16-bit service identifiers
    pub const UUID16_COMPLETE: u8 = 0x03;
    /// Incomplete list of 32-bit service identifiers
    pub const UUID32_MORE: u8 = 0x04;
    /// Complete list of 32-bit service identifiers
    pub const UUID32_COMPLETE: u8 = 0x05;
    /// Incomplete list of 128-bit service identifiers
    pub const UUID128_MORE: u8 = 0x06;
    /// Complete list of 128-bit service identifiers
    pub const UUID128_COMPLETE: u8 = 0x07;
    /// Complete local name
    pub const NAME: u8 = 0x09;
    /// GAP appearance
    pub const APPEARANCE: u8 = 0x19;
}

const FLAG_LIMITED_DISCOVERABLE: u8 = 0x01;
const FLAG_GENERAL_DISCOVERABLE: u8 = 0x02;
const FLAG_BR_EDR_NOT_SUPPORTED: u8 = 0x04;
const FLAG_BR_EDR_SIMULTANEOUS: u8 = 0x18;

/// Decoded contents of an advertisement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisingData {
    /// Limited (rather than general) discoverable mode
    pub limited_discoverable: bool,
    /// Advertiser also speaks BR/EDR
    pub br_edr: bool,
    /// Local name
    pub name: Option<String>,
    /// Advertised service identifiers, in record order
    pub services: Vec<ServiceUuid>,
    /// GAP appearance value
    pub appearance: Option<u16>,
}

impl AdvertisingData {
    /// Advertisement announcing `name` as a member of `service`
    pub fn for_node(name: impl Into<String>, service: ServiceUuid) -> Self {
        Self {
            name: Some(name.into()),
            services: vec![service],
            ..Self::default()
        }
    }

    /// Set the appearance record
    pub fn with_appearance(mut self, appearance: u16) -> Self {
        self.appearance = Some(appearance);
        self
    }

    /// Encode as a TLV record sequence.
    ///
    /// Record order: flags, name, one record per service, appearance.
    pub fn encode(&self) -> MeshResult<Vec<u8>> {
        let mut payload = Vec::with_capacity(ADV_MAX_PAYLOAD);

        let discoverable = if self.limited_discoverable {
            FLAG_LIMITED_DISCOVERABLE
        } else {
            FLAG_GENERAL_DISCOVERABLE
        };
        let br_edr = if self.br_edr {
            FLAG_BR_EDR_SIMULTANEOUS
        } else {
            FLAG_BR_EDR_NOT_SUPPORTED
        };
        append_record(&mut payload, record_type::FLAGS, &[discoverable + br_edr])?;

        if let Some(name) = &self.name {
            append_record(&mut payload, record_type::NAME, name.as_bytes())?;
        }

        for service in &self.services {
            let adv_type = match service {
                ServiceUuid::Uuid16(_) => record_type::UUID16_COMPLETE,
                ServiceUuid::Uuid32(_) => record_type::UUID32_COMPLETE,
                ServiceUuid::Uuid128(_) => record_type::UUID128_COMPLETE,
            };
            append_record(&mut payload, adv_type, &service.to_le_bytes())?;
        }

        if let Some(appearance) = self.appearance {
            append_record(&mut payload, record_type::APPEARANCE, &appearance.to_le_bytes())?;
        }

        if payload.len() > ADV_MAX_PAYLOAD {
            return Err(MeshError::PayloadTooLarge {
                size: payload.len(),
                limit: ADV_MAX_PAYLOAD,
            });
        }
        Ok(payload)
    }

    /// Decode a payload produced by [`encode`](Self::encode) or by any
    /// other advertiser.
    pub fn decode(payload: &[u8]) -> MeshResult<Self> {
        let mut data = Self::default();
        let mut saw_flags = false;

        for record in AdvRecords::new(payload) {
            let (adv_type, value) = record?;
            match adv_type {
                record_type::FLAGS if !saw_flags => {
                    let flags = *value.first().ok_or_else(|| {
                        MeshError::MalformedAdvertisement("empty flags record".to_string())
                    })?;
                    data.limited_discoverable = flags & FLAG_LIMITED_DISCOVERABLE != 0;
                    data.br_edr = flags & FLAG_BR_EDR_NOT_SUPPORTED == 0;
                    saw_flags = true;
                }
                record_type::NAME if data.name.is_none() => {
                    let name = std::str::from_utf8(value).map_err(|e| {
                        MeshError::MalformedAdvertisement(format!("name is not UTF-8: {e}"))
                    })?;
                    data.name = Some(name.to_string());
                }
                record_type::APPEARANCE if data.appearance.is_none() => {
                    if value.len() != 2 {
                        return Err(MeshError::MalformedAdvertisement(format!(
                            "appearance record has {} bytes",
                            value.len()
                        )));
                    }
                    data.appearance = Some(u16::from_le_bytes([value[0], value[1]]));
                }
                other => {
                    if let Some(width) = uuid_width(other) {
                        push_services(&mut data.services, value, width)?;
                    }
                }
            }
        }
        Ok(data)
    }
}

/// Walks the `[length][type][data]` records of an advertising payload
pub struct AdvRecords<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl<'a> AdvRecords<'a> {
    /// Iterate over the records of `payload`
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, offset: 0 }
    }
}

impl<'a> Iterator for AdvRecords<'a> {
    type Item = MeshResult<(u8, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.payload.get(self.offset)? as usize;
        // A zero length byte starts the insignificant (padding) part
        if len == 0 {
            self.offset = self.payload.len();
            return None;
        }
        let end = self.offset + 1 + len;
        if end > self.payload.len() {
            let err = MeshError::MalformedAdvertisement(format!(
                "record at offset {} claims {} bytes, {} remain",
                self.offset,
                len,
                self.payload.len() - self.offset - 1
            ));
            self.offset = self.payload.len();
            return Some(Err(err));
        }
        let adv_type = self.payload[self.offset + 1];
        let value = &self.payload[self.offset + 2..end];
        self.offset = end;
        Some(Ok((adv_type, value)))
    }
}

/// Service identifiers listed in an advertisement, in record order
pub fn decode_services(payload: &[u8]) -> MeshResult<Vec<ServiceUuid>> {
    let mut services = Vec::new();
    for record in AdvRecords::new(payload) {
        let (adv_type, value) = record?;
        if let Some(width) = uuid_width(adv_type) {
            push_services(&mut services, value, width)?;
        }
    }
    Ok(services)
}

/// Whether a scanned advertiser may be recruited as a child.
///
/// The advertiser must be connectable (general or directed) and list the
/// mesh service. Payloads that fail to decode are never candidates.
pub fn is_mesh_candidate(adv_type: AdvType, adv_data: &[u8], service: &ServiceUuid) -> bool {
    if !adv_type.is_connectable() {
        return false;
    }
    match decode_services(adv_data) {
        Ok(services) => services.contains(service),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring undecodable advertisement");
            false
        }
    }
}

fn append_record(payload: &mut Vec<u8>, adv_type: u8, value: &[u8]) -> MeshResult<()> {
    // The length byte covers the type byte as well
    let len = u8::try_from(value.len() + 1).map_err(|_| MeshError::PayloadTooLarge {
        size: payload.len() + value.len() + 2,
        limit: ADV_MAX_PAYLOAD,
    })?;
    payload.push(len);
    payload.push(adv_type);
    payload.extend_from_slice(value);
    Ok(())
}

fn uuid_width(adv_type: u8) -> Option<usize> {
    match adv_type {
        record_type::UUID16_MORE | record_type::UUID16_COMPLETE => Some(2),
        record_type::UUID32_MORE | record_type::UUID32_COMPLETE => Some(4),
        record_type::UUID128_MORE | record_type::UUID128_COMPLETE => Some(16),
        _ => None,
    }
}

fn push_services(services: &mut Vec<ServiceUuid>, value: &[u8], width: usize) -> MeshResult<()> {
    if value.len() % width != 0 {
        return Err(MeshError::MalformedAdvertisement(format!(
            "{}-byte service list is not a multiple of {width}",
            value.len()
        )));
    }
    services.extend(value.chunks_exact(width).filter_map(ServiceUuid::from_le_bytes));
    Ok(())
}
