//! Configuration management for piconet nodes.

use serde::{Deserialize, Serialize};
#[cfg(feature = "toml")]
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::types::NodeIdentity;

/// Maximum number of child links a node keeps.
pub const CHILD_CAPACITY: usize = 6;

/// Default advertising interval in microseconds.
pub const DEFAULT_ADVERTISE_INTERVAL_US: u32 = 500_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    #[serde(default)]
    pub radio: RadioConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub identity: NodeIdentity,
    #[serde(default = "default_accepts_children")]
    pub accepts_children: bool,
    #[serde(default = "default_child_capacity")]
    pub child_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioConfig {
    #[serde(default = "default_advertise_interval")]
    pub advertise_interval_us: u32,
    /// GAP appearance value; 0 leaves it out of the advertisement
    #[serde(default)]
    pub appearance: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            advertise_interval_us: DEFAULT_ADVERTISE_INTERVAL_US,
            appearance: 0,
        }
    }
}

fn default_accepts_children() -> bool {
    true
}

fn default_child_capacity() -> usize {
    CHILD_CAPACITY
}

fn default_advertise_interval() -> u32 {
    DEFAULT_ADVERTISE_INTERVAL_US
}

impl Config {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config for a node with the given identity and default everything else.
    pub fn for_node(identity: NodeIdentity) -> Self {
        Self {
            node: NodeConfig {
                identity,
                accepts_children: true,
                child_capacity: CHILD_CAPACITY,
            },
            radio: RadioConfig::default(),
        }
    }

    pub fn default_config() -> Self {
        Self::for_node(NodeIdentity::Number(1))
    }

    pub fn validate(&self) -> Result<()> {
        self.node.identity.validate()?;
        let capacity = self.node.child_capacity;
        if capacity == 0 || capacity > CHILD_CAPACITY {
            return Err(CoreError::Config(format!(
                "child_capacity must be within 1..={CHILD_CAPACITY}, got {capacity}"
            )));
        }
        if self.radio.advertise_interval_us == 0 {
            return Err(CoreError::Config(
                "advertise_interval_us must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
