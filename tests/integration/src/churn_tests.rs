//! Nodes leaving and joining a formed tree

use crate::test_utils::*;
use piconet_core::CHILD_CAPACITY;
use piconet_mesh::{DiscoveryState, TurnDirection};
use piconet_sim::MotionCall;

#[test]
fn test_leaf_loss_reopens_parent_slot() {
    let (mut sim, ids) = build_tree(21, &uniform(3, 1));
    let leaf = deepest(&sim, &ids);
    let parent = sim.parent_of(leaf).unwrap();
    assert_eq!(sim.node(parent).unwrap().discovery_state(), DiscoveryState::Full);

    sim.power_off(leaf).unwrap();
    sim.settle().unwrap();

    let parent_node = sim.node(parent).unwrap();
    assert_eq!(parent_node.links().child_count(), 0);
    assert_eq!(parent_node.discovery_state(), DiscoveryState::Scanning);
    assert!(sim.bus().is_scanning(parent));
}

#[test]
fn test_late_node_joins() {
    let (mut sim, ids) = build_tree(22, &uniform(4, CHILD_CAPACITY));

    let late = sim.add_node(&node_config(9, CHILD_CAPACITY)).unwrap();
    sim.settle().unwrap();

    assert_eq!(sim.depth_of(late), Some(2));
    assert_eq!(sim.parent_of(late), Some(ids[0]));

    sim.send_command(&command(9, TurnDirection::Right, 15, 5)).unwrap();
    sim.settle().unwrap();
    assert_eq!(sim.take_app_acks(), vec![vec![0x00, 9]]);
}

#[test]
fn test_orphan_keeps_subtree_and_reattaches() {
    let (mut sim, ids) = build_tree(23, &uniform(4, 1));
    let mut chain = ids.clone();
    chain.sort_by_key(|&id| sim.depth_of(id));
    let (interior, orphan, grandchild) = (chain[1], chain[2], chain[3]);

    sim.power_off(interior).unwrap();
    sim.settle().unwrap();

    // The orphan came back under the root with its child in tow
    assert_eq!(sim.parent_of(orphan), Some(chain[0]));
    assert_eq!(sim.parent_of(grandchild), Some(orphan));
    assert_eq!(sim.depth_of(grandchild), Some(3));
    assert_eq!(sim.node(orphan).unwrap().links().child_count(), 1);

    let number = number_of(&sim, grandchild);
    sim.send_command(&command(number, TurnDirection::Left, 180, 40))
        .unwrap();
    sim.settle().unwrap();

    assert_eq!(
        sim.node(grandchild).unwrap().motion().calls(),
        &[MotionCall::Turn(180), MotionCall::Straight(40)]
    );
    assert_eq!(sim.take_app_acks(), vec![vec![0x00, number]]);
}

#[test]
fn test_command_to_powered_off_node_is_lost() {
    let (mut sim, ids) = build_tree(24, &uniform(3, CHILD_CAPACITY));
    let gone = ids[2];
    let number = number_of(&sim, gone);
    sim.power_off(gone).unwrap();
    sim.settle().unwrap();

    sim.send_command(&command(number, TurnDirection::Right, 1, 1))
        .unwrap();
    sim.settle().unwrap();

    assert!(sim.take_app_acks().is_empty());
    assert_eq!(total_moves(&sim, &ids), 0);
}

#[test]
fn test_orphan_never_adopted_by_its_own_child() {
    for seed in 0..16 {
        let (mut sim, ids) = build_tree(seed, &uniform(4, 1));
        let mut chain = ids.clone();
        chain.sort_by_key(|&id| sim.depth_of(id));
        let (root, interior, orphan, child) = (chain[0], chain[1], chain[2], chain[3]);

        sim.power_off(interior).unwrap();
        sim.settle().unwrap();

        assert_eq!(sim.parent_of(orphan), Some(root), "seed {seed}");
        assert_eq!(sim.parent_of(child), Some(orphan), "seed {seed}");
        assert_eq!(sim.depth_of(child), Some(3), "seed {seed}");
    }
}
