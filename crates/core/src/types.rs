//! Core types shared by every layer of the piconet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Longest name a [`NodeIdentity::Name`] may carry, in bytes.
pub const MAX_NAME_LEN: usize = 8;

/// Leading byte of the numeric identity encoding.
const NUMERIC_TAG: u8 = 0x00;

/// Identity of a node in the mesh.
///
/// Fixed for the lifetime of the node process. Two nodes may share an
/// identity on purpose when both should follow the same command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeIdentity {
    /// Small integer identity (0-255)
    Number(u8),
    /// Short name, 1 to [`MAX_NAME_LEN`] bytes of UTF-8
    Name(String),
}

impl NodeIdentity {
    /// Build a name identity, validating it.
    pub fn name(name: impl Into<String>) -> Result<Self, CoreError> {
        let identity = Self::Name(name.into());
        identity.validate()?;
        Ok(identity)
    }

    /// Check that the identity can be encoded and read back unchanged.
    ///
    /// Names must be 1 to [`MAX_NAME_LEN`] bytes and must not spell a
    /// number in 0-255, which the text form would turn into a
    /// [`NodeIdentity::Number`].
    pub fn validate(&self) -> Result<(), CoreError> {
        let Self::Name(name) = self else {
            return Ok(());
        };
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(CoreError::InvalidIdentity(format!(
                "name must be 1..={MAX_NAME_LEN} bytes, got {}",
                name.len()
            )));
        }
        if is_numeric_text(name) {
            return Err(CoreError::InvalidIdentity(format!(
                "name {name:?} reads as a number; use NodeIdentity::Number"
            )));
        }
        Ok(())
    }

    /// Number of bytes [`encode_into`](Self::encode_into) appends.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Number(_) => 2,
            Self::Name(name) => 1 + name.len(),
        }
    }

    /// Append the wire encoding: `[0x00][id]` or `[len][utf8]`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Number(id) => {
                buf.push(NUMERIC_TAG);
                buf.push(*id);
            }
            Self::Name(name) => {
                // Valid names are at most MAX_NAME_LEN bytes; see validate
                buf.push(name.len() as u8);
                buf.extend_from_slice(name.as_bytes());
            }
        }
    }

    /// Wire encoding as a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Decode an identity from the front of `bytes`, returning the rest.
    pub fn decode_prefix(bytes: &[u8]) -> Result<(Self, &[u8]), CoreError> {
        let (&tag, rest) = bytes
            .split_first()
            .ok_or_else(|| CoreError::InvalidIdentity("empty identity".to_string()))?;

        if tag == NUMERIC_TAG {
            let (&id, rest) = rest
                .split_first()
                .ok_or_else(|| CoreError::InvalidIdentity("numeric identity truncated".to_string()))?;
            return Ok((Self::Number(id), rest));
        }

        let len = tag as usize;
        if len > MAX_NAME_LEN {
            return Err(CoreError::InvalidIdentity(format!(
                "name length {len} exceeds {MAX_NAME_LEN}"
            )));
        }
        if rest.len() < len {
            return Err(CoreError::InvalidIdentity(format!(
                "name needs {len} bytes, {} available",
                rest.len()
            )));
        }
        let (name, rest) = rest.split_at(len);
        let name = std::str::from_utf8(name)
            .map_err(|e| CoreError::InvalidIdentity(format!("name is not UTF-8: {e}")))?;
        Ok((Self::Name(name.to_string()), rest))
    }

    /// Decode an identity that must occupy all of `bytes`.
    pub fn decode_exact(bytes: &[u8]) -> Result<Self, CoreError> {
        let (identity, rest) = Self::decode_prefix(bytes)?;
        if !rest.is_empty() {
            return Err(CoreError::InvalidIdentity(format!(
                "{} trailing bytes after identity",
                rest.len()
            )));
        }
        Ok(identity)
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl FromStr for NodeIdentity {
    type Err = CoreError;

    /// All-digit strings within 0-255 are numeric, anything else is a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_numeric_text(s) {
            if let Ok(id) = s.parse::<u8>() {
                return Ok(Self::Number(id));
            }
        }
        Self::name(s)
    }
}

fn is_numeric_text(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && s.parse::<u8>().is_ok()
}

impl TryFrom<String> for NodeIdentity {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeIdentity> for String {
    fn from(identity: NodeIdentity) -> Self {
        identity.to_string()
    }
}

/// Opaque token naming one live radio link.
///
/// Meaningless across reconnects: a new connection gets a new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionHandle(pub u16);

impl ConnectionHandle {
    /// Handle value radio stacks report for a connection that never came up
    pub const INVALID: ConnectionHandle = ConnectionHandle(0xFFFF);

    /// Whether this handle can name a tracked link
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_and_name() {
        assert_eq!("7".parse::<NodeIdentity>().unwrap(), NodeIdentity::Number(7));
        assert_eq!("255".parse::<NodeIdentity>().unwrap(), NodeIdentity::Number(255));
        // Out of numeric range falls back to a name
        assert_eq!(
            "256".parse::<NodeIdentity>().unwrap(),
            NodeIdentity::Name("256".to_string())
        );
        assert_eq!(
            "rover".parse::<NodeIdentity>().unwrap(),
            NodeIdentity::Name("rover".to_string())
        );
    }

    #[test]
    fn test_reject_bad_names() {
        assert!("".parse::<NodeIdentity>().is_err());
        assert!("ninechars".parse::<NodeIdentity>().is_err());
    }

    #[test]
    fn test_wire_encoding() {
        assert_eq!(NodeIdentity::Number(3).to_bytes(), vec![0x00, 3]);
        assert_eq!(
            NodeIdentity::name("ab").unwrap().to_bytes(),
            vec![2, b'a', b'b']
        );
    }

    #[test]
    fn test_decode_prefix_leaves_rest() {
        let (identity, rest) = NodeIdentity::decode_prefix(&[3, b'x', b'r', b'p', 1, 90]).unwrap();
        assert_eq!(identity, NodeIdentity::Name("xrp".to_string()));
        assert_eq!(rest, &[1, 90]);
    }

    #[test]
    fn test_decode_rejects_truncation() {
        assert!(NodeIdentity::decode_prefix(&[]).is_err());
        assert!(NodeIdentity::decode_prefix(&[0x00]).is_err());
        assert!(NodeIdentity::decode_prefix(&[4, b'a']).is_err());
        assert!(NodeIdentity::decode_prefix(&[9, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_decode_exact_rejects_trailing() {
        assert!(NodeIdentity::decode_exact(&[0x00, 1, 2]).is_err());
        assert_eq!(
            NodeIdentity::decode_exact(&[0x00, 1]).unwrap(),
            NodeIdentity::Number(1)
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&NodeIdentity::Number(12)).unwrap();
        assert_eq!(json, "\"12\"");
        let back: NodeIdentity = serde_json::from_str("\"scout\"").unwrap();
        assert_eq!(back, NodeIdentity::Name("scout".to_string()));
    }

    #[test]
    fn test_validate_catches_unchecked_names() {
        assert!(NodeIdentity::Name(String::new()).validate().is_err());
        assert!(NodeIdentity::Name("ninechars".to_string()).validate().is_err());
        // Would come back as Number(5) through its text form
        assert!(NodeIdentity::Name("5".to_string()).validate().is_err());
        assert!(NodeIdentity::name("5").is_err());
        assert!(NodeIdentity::Number(5).validate().is_ok());
        assert!(NodeIdentity::Name("256".to_string()).validate().is_ok());
    }

    #[test]
    fn test_valid_identities_survive_serde() {
        for identity in [
            NodeIdentity::Number(0),
            NodeIdentity::Number(255),
            NodeIdentity::name("256").unwrap(),
            NodeIdentity::name("rover").unwrap(),
        ] {
            let json = serde_json::to_string(&identity).unwrap();
            assert_eq!(serde_json::from_str::<NodeIdentity>(&json).unwrap(), identity);
        }
    }

    #[test]
    fn test_invalid_handle() {
        assert!(!ConnectionHandle::INVALID.is_valid());
        assert!(ConnectionHandle(1).is_valid());
    }
}
