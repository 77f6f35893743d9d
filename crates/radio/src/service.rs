//! Service identifiers and the mesh GATT service definition.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 128-bit identifier of the mesh service every node exposes and advertises.
pub const MESH_SERVICE_UUID: Uuid = Uuid::from_u128(0x51ff9301_d04e_4a0d_91c9_975fca9cdf95);

/// 128-bit identifier of the writable command characteristic.
pub const COMMAND_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0xed59696a_b609_4cea_a09a_5885cce3c5ca);

/// A service identifier as carried in advertisements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceUuid {
    /// SIG-assigned 16-bit identifier
    Uuid16(u16),
    /// 32-bit identifier
    Uuid32(u32),
    /// Full 128-bit identifier
    Uuid128(Uuid),
}

impl ServiceUuid {
    /// Length of the little-endian wire form.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Uuid16(_) => 2,
            Self::Uuid32(_) => 4,
            Self::Uuid128(_) => 16,
        }
    }

    /// Little-endian wire form, as placed in advertising records.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Self::Uuid16(v) => v.to_le_bytes().to_vec(),
            Self::Uuid32(v) => v.to_le_bytes().to_vec(),
            Self::Uuid128(u) => {
                // Radio byte order is the full reverse of the textual order
                let mut bytes = *u.as_bytes();
                bytes.reverse();
                bytes.to_vec()
            }
        }
    }

    /// Parse the little-endian wire form; the width is taken from the slice length.
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes.len() {
            2 => Some(Self::Uuid16(u16::from_le_bytes([bytes[0], bytes[1]]))),
            4 => Some(Self::Uuid32(u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            16 => {
                let mut raw = [0u8; 16];
                raw.copy_from_slice(bytes);
                raw.reverse();
                Some(Self::Uuid128(Uuid::from_bytes(raw)))
            }
            _ => None,
        }
    }
}

impl From<Uuid> for ServiceUuid {
    fn from(uuid: Uuid) -> Self {
        Self::Uuid128(uuid)
    }
}

impl fmt::Display for ServiceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid16(v) => write!(f, "0x{v:04x}"),
            Self::Uuid32(v) => write!(f, "0x{v:08x}"),
            Self::Uuid128(u) => write!(f, "{u}"),
        }
    }
}

/// Characteristic property bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicFlags(pub u16);

impl CharacteristicFlags {
    /// Readable
    pub const READ: Self = Self(0x0002);
    /// Writable without response
    pub const WRITE_NO_RESPONSE: Self = Self(0x0004);
    /// Writable with response
    pub const WRITE: Self = Self(0x0008);
    /// Notifiable
    pub const NOTIFY: Self = Self(0x0010);

    /// Whether every bit of `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CharacteristicFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The single service a node registers with its radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshService {
    /// Service identifier, also advertised
    pub service: Uuid,
    /// Command characteristic identifier
    pub command: Uuid,
    /// Properties of the command characteristic
    pub command_flags: CharacteristicFlags,
}

impl MeshService {
    /// The service layout shared by every node in the mesh.
    pub fn standard() -> Self {
        Self {
            service: MESH_SERVICE_UUID,
            command: COMMAND_CHARACTERISTIC_UUID,
            // Acks travel back up as notifications on the same attribute
            command_flags: CharacteristicFlags::WRITE
                | CharacteristicFlags::WRITE_NO_RESPONSE
                | CharacteristicFlags::NOTIFY,
        }
    }

    /// The service identifier in advertisement form.
    pub fn advertised_uuid(&self) -> ServiceUuid {
        ServiceUuid::Uuid128(self.service)
    }
}
