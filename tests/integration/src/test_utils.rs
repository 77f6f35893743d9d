//! Test utilities for multi-node scenarios

use piconet_core::{Config, NodeIdentity};
use piconet_mesh::{CommandPacket, Maneuver, TurnDirection};
use piconet_sim::{NodeId, Simulation};

/// Install the test log subscriber
pub fn init_logging() {
    piconet_core::logging::init_for_tests();
}

/// Numeric node config with the given child capacity
pub fn node_config(id: u8, child_capacity: usize) -> Config {
    let mut config = Config::for_node(NodeIdentity::Number(id));
    config.node.child_capacity = child_capacity;
    config
}

/// Nodes `1..=count`, all with `child_capacity`
pub fn uniform(count: u8, child_capacity: usize) -> Vec<Config> {
    (1..=count).map(|id| node_config(id, child_capacity)).collect()
}

/// Power up `configs` (the first is the root), connect the app to the
/// root and let the tree form.
pub fn build_tree(seed: u64, configs: &[Config]) -> (Simulation, Vec<NodeId>) {
    init_logging();
    let mut sim = Simulation::new(seed);
    let ids: Vec<NodeId> = configs
        .iter()
        .map(|config| sim.add_node(config).unwrap())
        .collect();
    sim.connect_app(ids[0]).unwrap();
    sim.settle().unwrap();
    assert!(sim.app_connected(), "app failed to reach the root");
    (sim, ids)
}

/// Command for `target`
pub fn command(target: u8, turn: TurnDirection, degrees: u8, distance_cm: u32) -> CommandPacket {
    CommandPacket::new(
        NodeIdentity::Number(target),
        Maneuver {
            turn,
            degrees,
            distance_cm,
        },
    )
}

/// Node furthest from the app
pub fn deepest(sim: &Simulation, ids: &[NodeId]) -> NodeId {
    let mut best = ids[0];
    for &id in ids {
        if sim.depth_of(id) > sim.depth_of(best) {
            best = id;
        }
    }
    best
}

/// Moves performed across all nodes
pub fn total_moves(sim: &Simulation, ids: &[NodeId]) -> usize {
    ids.iter()
        .map(|&id| sim.node(id).unwrap().motion().moves())
        .sum()
}

/// Identity number of a numeric node
pub fn number_of(sim: &Simulation, id: NodeId) -> u8 {
    match sim.node(id).unwrap().identity() {
        NodeIdentity::Number(n) => *n,
        other => panic!("expected a numeric identity, got {other}"),
    }
}
