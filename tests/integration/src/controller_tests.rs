//! Controller driving a simulated piconet end to end

use crate::test_utils::*;
use piconet_controller::{Controller, ControllerError, MovePlan, Position};
use piconet_core::NodeIdentity;
use piconet_sim::{MotionCall, Simulation};

fn controller_for(sim: &Simulation) -> Controller {
    let mut controller = Controller::new();
    for (i, id) in sim.node_ids().into_iter().enumerate() {
        let identity = sim.node(id).unwrap().identity().clone();
        controller
            .add_unit(identity, Position::new(100.0 * i as f64, 0.0), 0.0)
            .unwrap();
    }
    controller
}

#[test]
fn test_planned_move_is_executed_and_tracked() {
    let (mut sim, ids) = build_tree(31, &uniform(4, 2));
    let mut controller = controller_for(&sim);
    let target = deepest(&sim, &ids);
    let identity = sim.node(target).unwrap().identity().clone();

    let start = controller.unit(&identity).unwrap().position;
    let destination = Position::new(start.x, start.y + 250.0);
    let plan = controller.plan_to(&identity, destination).unwrap();

    let packet = controller.send(&identity, plan).unwrap();
    sim.send_command(&packet).unwrap();
    sim.settle().unwrap();

    assert_eq!(
        sim.node(target).unwrap().motion().calls(),
        &[MotionCall::Turn(plan.signed_degrees()), MotionCall::Straight(250)]
    );

    for ack in sim.take_app_acks() {
        assert_eq!(controller.on_ack(&ack).unwrap(), identity);
    }
    let unit = controller.unit(&identity).unwrap();
    assert!(!unit.is_busy());
    assert!((unit.position.x - destination.x).abs() < 1.0);
    assert!((unit.position.y - destination.y).abs() < 1.0);
}

#[test]
fn test_second_command_waits_for_ack() {
    let (mut sim, _ids) = build_tree(32, &uniform(3, 2));
    let mut controller = controller_for(&sim);
    let identity = NodeIdentity::Number(3);
    let plan = MovePlan::from_turn(-45.0, 10);

    let packet = controller.send(&identity, plan).unwrap();
    assert!(matches!(
        controller.send(&identity, plan),
        Err(ControllerError::Busy(_))
    ));

    sim.send_command(&packet).unwrap();
    sim.settle().unwrap();
    let acks = sim.take_app_acks();
    assert_eq!(acks.len(), 1);
    controller.on_ack(&acks[0]).unwrap();

    // Unlocked again
    let packet = controller.send(&identity, plan).unwrap();
    sim.send_command(&packet).unwrap();
    sim.settle().unwrap();
    controller.on_ack(&sim.take_app_acks()[0]).unwrap();

    let unit = controller.unit(&identity).unwrap();
    assert!((unit.heading_deg - 270.0).abs() < 1e-9);
}

#[test]
fn test_unreachable_unit_is_cancelled() {
    let (mut sim, _ids) = build_tree(33, &uniform(2, 2));
    let mut controller = controller_for(&sim);
    let ghost = NodeIdentity::Number(7);
    controller
        .add_unit(ghost.clone(), Position::default(), 0.0)
        .unwrap();

    let packet = controller.send(&ghost, MovePlan::from_turn(10.0, 10)).unwrap();
    sim.send_command(&packet).unwrap();
    sim.settle().unwrap();

    assert!(sim.take_app_acks().is_empty());
    assert!(controller.cancel(&ghost).unwrap().is_some());
    assert!(!controller.unit(&ghost).unwrap().is_busy());
}

#[test]
fn test_named_units_route_by_name() {
    let mut configs = uniform(2, 2);
    configs.push(piconet_core::Config::for_node(NodeIdentity::Name("rover".into())));
    let (mut sim, ids) = build_tree(34, &configs);
    let mut controller = controller_for(&sim);
    let rover = NodeIdentity::Name("rover".into());

    let packet = controller
        .send(&rover, MovePlan::from_turn(90.0, 120))
        .unwrap();
    assert_eq!(&packet.as_bytes()[..6], b"\x05rover");
    sim.send_command(&packet).unwrap();
    sim.settle().unwrap();

    assert_eq!(sim.node(ids[2]).unwrap().motion().moves(), 1);
    let acks = sim.take_app_acks();
    assert_eq!(acks, vec![b"\x05rover".to_vec()]);
    assert_eq!(controller.on_ack(&acks[0]).unwrap(), rover);
}
