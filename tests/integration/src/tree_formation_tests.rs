//! Tree formation under the child-capacity limit

use crate::test_utils::*;
use piconet_core::CHILD_CAPACITY;
use piconet_mesh::DiscoveryState;

#[test]
fn test_every_node_joins_the_tree() {
    let (sim, ids) = build_tree(11, &uniform(8, CHILD_CAPACITY));

    for &id in &ids {
        assert!(sim.depth_of(id).is_some(), "{id} never attached");
        let node = sim.node(id).unwrap();
        assert!(node.links().child_count() <= CHILD_CAPACITY);
        assert_ne!(node.discovery_state(), DiscoveryState::Advertising);
    }
    // One link per node: the root's comes from the app
    assert_eq!(sim.bus().links().len(), ids.len());
}

#[test]
fn test_root_fills_to_capacity() {
    let (sim, ids) = build_tree(5, &uniform(8, CHILD_CAPACITY));

    let root = sim.node(ids[0]).unwrap();
    assert_eq!(root.links().child_count(), 6);
    assert_eq!(root.discovery_state(), DiscoveryState::Full);
    assert!(!sim.bus().is_scanning(ids[0]));

    // The seventh candidate ends up one hop further down
    let grandchildren = ids.iter().filter(|&&id| sim.depth_of(id) == Some(3)).count();
    assert_eq!(grandchildren, 1);
}

#[test]
fn test_small_capacity_builds_deeper_tree() {
    let (sim, ids) = build_tree(3, &uniform(7, 2));

    for &id in &ids {
        assert!(sim.depth_of(id).is_some());
        assert!(sim.node(id).unwrap().links().child_count() <= 2);
    }
    assert!(ids.iter().any(|&id| sim.depth_of(id) >= Some(3)));
}

#[test]
fn test_capacity_one_builds_a_chain() {
    let (sim, ids) = build_tree(9, &uniform(5, 1));

    let mut depths: Vec<usize> = ids.iter().map(|&id| sim.depth_of(id).unwrap()).collect();
    depths.sort_unstable();
    assert_eq!(depths, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_leaf_only_nodes_do_not_recruit() {
    let mut configs = uniform(9, CHILD_CAPACITY);
    for config in configs.iter_mut().skip(1) {
        config.node.accepts_children = false;
    }
    let (sim, ids) = build_tree(2, &configs);

    let attached: Vec<_> = ids.iter().filter(|&&id| sim.depth_of(id).is_some()).collect();
    assert_eq!(attached.len(), 1 + CHILD_CAPACITY);
    for &id in ids.iter().skip(1) {
        let node = sim.node(id).unwrap();
        assert_eq!(node.links().child_count(), 0);
        if sim.depth_of(id).is_some() {
            assert_eq!(node.discovery_state(), DiscoveryState::Attached);
        } else {
            // Nobody left to find them
            assert_eq!(node.discovery_state(), DiscoveryState::Advertising);
            assert!(sim.bus().is_advertising(id));
        }
    }
}

#[test]
fn test_formation_is_deterministic_for_a_seed() {
    let (a, ids_a) = build_tree(42, &uniform(8, 2));
    let (b, ids_b) = build_tree(42, &uniform(8, 2));

    let shape = |sim: &piconet_sim::Simulation, ids: &[piconet_sim::NodeId]| {
        ids.iter().map(|&id| sim.parent_of(id)).collect::<Vec<_>>()
    };
    assert_eq!(shape(&a, &ids_a), shape(&b, &ids_b));
}
