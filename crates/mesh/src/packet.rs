//! Command and acknowledgement wire formats
//!
//! Command: `[target identity][turn sign][turn degrees][distance digits...]`
//! where the distance digits are big-endian base-256 and there is at least
//! one of them. Ack: `[sender identity]`.
//!
//! A decoded packet keeps the exact bytes it was decoded from; forwarding
//! sends those bytes, never a re-encoding.

use piconet_core::NodeIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MeshError, MeshResult};

/// Direction of the turn that precedes the straight move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Counter-clockwise, wire value 0
    Left,
    /// Clockwise, wire value 1
    Right,
}

impl TurnDirection {
    /// Any non-zero sign byte means right.
    pub fn from_wire(byte: u8) -> Self {
        if byte == 0 {
            Self::Left
        } else {
            Self::Right
        }
    }

    /// Sign byte: 0 for left, 1 for right
    pub fn to_wire(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// A decoded move: turn in place, then drive straight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maneuver {
    /// Turn direction
    pub turn: TurnDirection,
    /// Turn magnitude in whole degrees
    pub degrees: u8,
    /// Straight distance after the turn
    pub distance_cm: u32,
}

impl Maneuver {
    /// Signed turn for the drivetrain: left is positive, right negative.
    pub fn signed_degrees(&self) -> i16 {
        match self.turn {
            TurnDirection::Left => i16::from(self.degrees),
            TurnDirection::Right => -i16::from(self.degrees),
        }
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "turn {:+} deg, straight {} cm",
            self.signed_degrees(),
            self.distance_cm
        )
    }
}

/// Smallest distance digit sequence that encodes `distance_cm`.
pub fn encode_distance(distance_cm: u32) -> Vec<u8> {
    let bytes = distance_cm.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

/// `sum(digit[i] * 256^(N-1-i))`, rejecting empty input and values past `u32`.
pub fn decode_distance(digits: &[u8]) -> MeshResult<u32> {
    if digits.is_empty() {
        return Err(MeshError::MalformedPacket(
            "missing distance digits".to_string(),
        ));
    }
    digits.iter().try_fold(0u32, |acc, &digit| {
        acc.checked_mul(256)
            .and_then(|v| v.checked_add(u32::from(digit)))
            .ok_or_else(|| {
                MeshError::MalformedPacket(format!(
                    "distance {} does not fit in 32 bits",
                    hex::encode(digits)
                ))
            })
    })
}

/// A self-addressed command, immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    target: NodeIdentity,
    maneuver: Maneuver,
    raw: Vec<u8>,
}

impl CommandPacket {
    /// Encode a command for `target`.
    pub fn new(target: NodeIdentity, maneuver: Maneuver) -> Self {
        let digits = encode_distance(maneuver.distance_cm);
        let mut raw = Vec::with_capacity(target.encoded_len() + 2 + digits.len());
        target.encode_into(&mut raw);
        raw.push(maneuver.turn.to_wire());
        raw.push(maneuver.degrees);
        raw.extend_from_slice(&digits);
        Self {
            target,
            maneuver,
            raw,
        }
    }

    /// Validate and decode a received command write.
    pub fn decode(bytes: &[u8]) -> MeshResult<Self> {
        let (target, rest) = NodeIdentity::decode_prefix(bytes)
            .map_err(|e| MeshError::MalformedPacket(format!("bad target: {e}")))?;
        if rest.len() < 3 {
            return Err(MeshError::MalformedPacket(format!(
                "{} bytes after target, need at least 3",
                rest.len()
            )));
        }
        let maneuver = Maneuver {
            turn: TurnDirection::from_wire(rest[0]),
            degrees: rest[1],
            distance_cm: decode_distance(&rest[2..])?,
        };
        Ok(Self {
            target,
            maneuver,
            raw: bytes.to_vec(),
        })
    }

    /// Addressed node
    pub fn target(&self) -> &NodeIdentity {
        &self.target
    }

    /// Decoded move
    pub fn maneuver(&self) -> &Maneuver {
        &self.maneuver
    }

    /// The bytes exactly as received (or encoded).
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Whether `identity` is the addressee
    pub fn is_for(&self, identity: &NodeIdentity) -> bool {
        &self.target == identity
    }
}

/// Completion report sent toward the root after a node executes a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AckNotification {
    /// Node that executed the command
    pub sender: NodeIdentity,
}

impl AckNotification {
    /// Ack from `sender`
    pub fn new(sender: NodeIdentity) -> Self {
        Self { sender }
    }

    /// Wire form: the sender's identity
    pub fn to_bytes(&self) -> Vec<u8> {
        self.sender.to_bytes()
    }

    /// Decode an ack that is exactly one identity.
    pub fn decode(bytes: &[u8]) -> MeshResult<Self> {
        let sender = NodeIdentity::decode_exact(bytes)
            .map_err(|e| MeshError::MalformedPacket(format!("bad ack: {e}")))?;
        Ok(Self { sender })
    }
}
