//! Multi-hop command delivery and ack return

use crate::test_utils::*;
use piconet_core::CHILD_CAPACITY;
use piconet_mesh::TurnDirection;
use piconet_sim::MotionCall;

#[test]
fn test_command_reaches_deepest_node_and_acks_once() {
    let (mut sim, ids) = build_tree(9, &uniform(5, 1));
    let target = deepest(&sim, &ids);
    let target_number = number_of(&sim, target);
    assert_eq!(sim.depth_of(target), Some(5));

    sim.send_command(&command(target_number, TurnDirection::Right, 90, 300))
        .unwrap();
    sim.settle().unwrap();

    assert_eq!(
        sim.node(target).unwrap().motion().calls(),
        &[MotionCall::Turn(-90), MotionCall::Straight(300)]
    );
    assert_eq!(total_moves(&sim, &ids), 1);
    assert_eq!(sim.take_app_acks(), vec![vec![0x00, target_number]]);
}

#[test]
fn test_root_executes_its_own_command() {
    let (mut sim, ids) = build_tree(4, &uniform(4, CHILD_CAPACITY));

    sim.send_command(&command(1, TurnDirection::Left, 45, 20)).unwrap();
    sim.settle().unwrap();

    assert_eq!(
        sim.node(ids[0]).unwrap().motion().calls(),
        &[MotionCall::Turn(45), MotionCall::Straight(20)]
    );
    assert_eq!(total_moves(&sim, &ids), 1);
    assert_eq!(sim.take_app_acks(), vec![vec![0x00, 1]]);
}

#[test]
fn test_absent_target_is_absorbed_silently() {
    let (mut sim, ids) = build_tree(6, &uniform(7, 2));

    sim.send_command(&command(99, TurnDirection::Right, 10, 10))
        .unwrap();
    sim.settle().unwrap();

    assert_eq!(total_moves(&sim, &ids), 0);
    assert!(sim.take_app_acks().is_empty());
    assert!(sim.take_surfaced_acks().is_empty());
}

#[test]
fn test_every_node_addressable_in_turn() {
    let (mut sim, ids) = build_tree(13, &uniform(8, 2));

    for &id in &ids {
        let number = number_of(&sim, id);
        sim.send_command(&command(number, TurnDirection::Left, number, u32::from(number) * 100))
            .unwrap();
        sim.settle().unwrap();
        assert_eq!(sim.take_app_acks(), vec![vec![0x00, number]]);
    }
    for &id in &ids {
        assert_eq!(sim.node(id).unwrap().motion().moves(), 1);
    }
}

#[test]
fn test_shared_identity_moves_both_and_acks_twice() {
    let mut configs = uniform(4, CHILD_CAPACITY);
    configs.push(node_config(3, CHILD_CAPACITY));
    let (mut sim, ids) = build_tree(8, &configs);

    sim.send_command(&command(3, TurnDirection::Right, 30, 50)).unwrap();
    sim.settle().unwrap();

    assert_eq!(sim.node(ids[2]).unwrap().motion().moves(), 1);
    assert_eq!(sim.node(ids[4]).unwrap().motion().moves(), 1);
    assert_eq!(sim.take_app_acks().len(), 2);
}

#[test]
fn test_commands_sent_together_each_run_once() {
    let (mut sim, ids) = build_tree(9, &uniform(3, 1));
    let mut chain = ids.clone();
    chain.sort_by_key(|&id| sim.depth_of(id));
    let (middle, leaf) = (chain[1], chain[2]);
    let (middle_number, leaf_number) = (number_of(&sim, middle), number_of(&sim, leaf));

    // Both writes land before the root drains either
    sim.send_command(&command(middle_number, TurnDirection::Left, 10, 1))
        .unwrap();
    sim.send_command(&command(leaf_number, TurnDirection::Right, 20, 2))
        .unwrap();
    sim.settle().unwrap();

    assert_eq!(
        sim.node(middle).unwrap().motion().calls(),
        &[MotionCall::Turn(10), MotionCall::Straight(1)]
    );
    assert_eq!(
        sim.node(leaf).unwrap().motion().calls(),
        &[MotionCall::Turn(-20), MotionCall::Straight(2)]
    );
    assert_eq!(sim.node(chain[0]).unwrap().motion().moves(), 0);

    let mut acks = sim.take_app_acks();
    acks.sort();
    let mut expected = vec![vec![0x00, middle_number], vec![0x00, leaf_number]];
    expected.sort();
    assert_eq!(acks, expected);
}
