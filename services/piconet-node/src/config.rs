//! Service configuration: the root node's config plus a simulation script.

use piconet_core::{Config, NodeConfig, NodeIdentity};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(flatten)]
    pub base: Config,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Nodes powered up besides the root
    #[serde(default)]
    pub nodes: Vec<NodeIdentity>,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Delay between simulation steps
    #[serde(default)]
    pub step_interval_ms: u64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            commands: Vec::new(),
            seed: default_seed(),
            step_interval_ms: 0,
            max_steps: default_max_steps(),
        }
    }
}

/// One scripted move: face `heading_deg`, then drive `distance_cm`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandSpec {
    pub target: NodeIdentity,
    pub heading_deg: f64,
    pub distance_cm: u32,
}

fn default_seed() -> u64 {
    0x5EED
}

fn default_max_steps() -> usize {
    piconet_sim::DEFAULT_SETTLE_STEPS
}

impl ServiceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.base.validate()?;
        Ok(config)
    }

    /// Config for every non-root node: the root's radio and capacity
    /// settings under another identity.
    pub fn member_config(&self, identity: NodeIdentity) -> Config {
        Config {
            node: NodeConfig {
                identity,
                accepts_children: true,
                child_capacity: self.base.node.child_capacity,
            },
            radio: self.base.radio.clone(),
        }
    }

    /// Identities of the simulated members, without repeating the root
    pub fn members(&self) -> impl Iterator<Item = &NodeIdentity> {
        let root = &self.base.node.identity;
        self.simulation.nodes.iter().filter(move |id| *id != root)
    }
}
