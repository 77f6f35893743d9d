//! Unit tracking with one command in flight per unit
//!
//! The controller sits above the root node. It encodes commands, refuses a
//! second command to a unit until the first is acknowledged, and dead-reckons
//! each unit's pose from the moves it has confirmed.

use piconet_core::NodeIdentity;
use piconet_mesh::{AckNotification, CommandPacket};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ControllerError, ControllerResult};
use crate::heading::{normalize_heading, Position};
use crate::plan::MovePlan;

/// What the controller knows about one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    /// Unit identity, as addressed on the mesh
    pub identity: NodeIdentity,
    /// Heading in degrees, `[0, 360)`
    pub heading_deg: f64,
    /// Dead-reckoned position
    pub position: Position,
    /// Command sent and not yet acknowledged
    pub in_flight: Option<MovePlan>,
}

impl UnitState {
    /// Whether a command is waiting for its ack
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn apply(&mut self, plan: &MovePlan) {
        self.heading_deg = normalize_heading(self.heading_deg + f64::from(plan.signed_degrees()));
        self.position = self
            .position
            .advance(self.heading_deg, f64::from(plan.distance_cm()));
    }
}

/// Command planner and tracker for the units of one piconet
#[derive(Debug, Default)]
pub struct Controller {
    units: HashMap<NodeIdentity, UnitState>,
}

impl Controller {
    /// Controller with no units
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a unit at a known pose.
    pub fn add_unit(
        &mut self,
        identity: NodeIdentity,
        position: Position,
        heading_deg: f64,
    ) -> ControllerResult<()> {
        identity.validate()?;
        if self.units.contains_key(&identity) {
            return Err(ControllerError::DuplicateUnit(identity));
        }
        self.units.insert(
            identity.clone(),
            UnitState {
                identity,
                heading_deg: normalize_heading(heading_deg),
                position,
                in_flight: None,
            },
        );
        Ok(())
    }

    /// State of one unit
    pub fn unit(&self, identity: &NodeIdentity) -> Option<&UnitState> {
        self.units.get(identity)
    }

    /// Every tracked unit, in no particular order
    pub fn units(&self) -> impl Iterator<Item = &UnitState> {
        self.units.values()
    }

    /// Plan a move that takes `target` to `destination`.
    pub fn plan_to(&self, target: &NodeIdentity, destination: Position) -> ControllerResult<MovePlan> {
        let unit = self
            .units
            .get(target)
            .ok_or_else(|| ControllerError::UnknownUnit(target.clone()))?;
        Ok(MovePlan::toward(unit.position, unit.heading_deg, destination))
    }

    /// Encode `plan` for `target` and mark the unit busy.
    pub fn send(&mut self, target: &NodeIdentity, plan: MovePlan) -> ControllerResult<CommandPacket> {
        let unit = self
            .units
            .get_mut(target)
            .ok_or_else(|| ControllerError::UnknownUnit(target.clone()))?;
        if unit.is_busy() {
            return Err(ControllerError::Busy(target.clone()));
        }
        unit.in_flight = Some(plan);

        let packet = CommandPacket::new(target.clone(), *plan.maneuver());
        tracing::info!(
            unit = %target,
            maneuver = %plan.maneuver(),
            bytes = %hex::encode(packet.as_bytes()),
            "Command sent"
        );
        Ok(packet)
    }

    /// Handle ack bytes notified by the root, returning the acking unit.
    pub fn on_ack(&mut self, bytes: &[u8]) -> ControllerResult<NodeIdentity> {
        let ack = AckNotification::decode(bytes)?;
        let unit = self
            .units
            .get_mut(&ack.sender)
            .ok_or_else(|| ControllerError::UnknownUnit(ack.sender.clone()))?;
        let plan = unit
            .in_flight
            .take()
            .ok_or_else(|| ControllerError::UnexpectedAck(ack.sender.clone()))?;
        unit.apply(&plan);

        tracing::info!(
            unit = %ack.sender,
            heading = unit.heading_deg,
            x = unit.position.x,
            y = unit.position.y,
            "Command acknowledged"
        );
        Ok(ack.sender)
    }

    /// Forget an in-flight command without an ack (lost unit, operator abort).
    pub fn cancel(&mut self, target: &NodeIdentity) -> ControllerResult<Option<MovePlan>> {
        let unit = self
            .units
            .get_mut(target)
            .ok_or_else(|| ControllerError::UnknownUnit(target.clone()))?;
        Ok(unit.in_flight.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with(ids: &[u8]) -> Controller {
        let mut controller = Controller::new();
        for (i, &id) in ids.iter().enumerate() {
            controller
                .add_unit(
                    NodeIdentity::Number(id),
                    Position::new(100.0 * (i as f64 + 1.0), 100.0),
                    0.0,
                )
                .unwrap();
        }
        controller
    }

    #[test]
    fn test_send_encodes_and_locks() {
        let mut controller = controller_with(&[1, 2]);
        let id = NodeIdentity::Number(2);
        let plan = MovePlan::from_turn(-90.0, 300);

        let packet = controller.send(&id, plan).unwrap();
        assert_eq!(packet.as_bytes(), &[0x00, 2, 1, 90, 0x01, 0x2C]);
        assert!(controller.unit(&id).unwrap().is_busy());

        assert!(matches!(
            controller.send(&id, plan),
            Err(ControllerError::Busy(_))
        ));
        // Other units are unaffected
        assert!(controller.send(&NodeIdentity::Number(1), plan).is_ok());
    }

    #[test]
    fn test_ack_unlocks_and_moves_unit() {
        let mut controller = controller_with(&[1]);
        let id = NodeIdentity::Number(1);
        controller.send(&id, MovePlan::from_turn(90.0, 50)).unwrap();

        assert_eq!(controller.on_ack(&[0x00, 1]).unwrap(), id);
        let unit = controller.unit(&id).unwrap();
        assert!(!unit.is_busy());
        assert!((unit.heading_deg - 90.0).abs() < 1e-9);
        assert!((unit.position.x - 100.0).abs() < 1e-9);
        assert!((unit.position.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_and_unexpected() {
        let mut controller = controller_with(&[1]);
        let stranger = NodeIdentity::Number(9);

        assert!(matches!(
            controller.send(&stranger, MovePlan::from_turn(0.0, 1)),
            Err(ControllerError::UnknownUnit(_))
        ));
        assert!(matches!(
            controller.on_ack(&[0x00, 9]),
            Err(ControllerError::UnknownUnit(_))
        ));
        assert!(matches!(
            controller.on_ack(&[0x00, 1]),
            Err(ControllerError::UnexpectedAck(_))
        ));
        assert!(matches!(
            controller.on_ack(&[0x42]),
            Err(ControllerError::Mesh(_))
        ));
    }

    #[test]
    fn test_plan_to_and_cancel() {
        let mut controller = controller_with(&[1]);
        let id = NodeIdentity::Number(1);

        let plan = controller.plan_to(&id, Position::new(100.0, 0.0)).unwrap();
        assert_eq!(plan.signed_degrees(), 90);
        assert_eq!(plan.distance_cm(), 100);

        controller.send(&id, plan).unwrap();
        assert_eq!(controller.cancel(&id).unwrap(), Some(plan));
        assert!(!controller.unit(&id).unwrap().is_busy());
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let mut controller = controller_with(&[1]);
        assert!(matches!(
            controller.add_unit(NodeIdentity::Number(1), Position::default(), 0.0),
            Err(ControllerError::DuplicateUnit(_))
        ));
    }

    #[test]
    fn test_unaddressable_unit_rejected() {
        let mut controller = Controller::new();
        assert!(matches!(
            controller.add_unit(NodeIdentity::Name(String::new()), Position::default(), 0.0),
            Err(ControllerError::InvalidIdentity(_))
        ));
        assert!(matches!(
            controller.add_unit(NodeIdentity::Name("7".to_string()), Position::default(), 0.0),
            Err(ControllerError::InvalidIdentity(_))
        ));
        assert_eq!(controller.units().count(), 0);
    }

    #[test]
    fn test_unit_state_serializes() {
        let controller = controller_with(&[3]);
        let json = serde_json::to_value(controller.unit(&NodeIdentity::Number(3)).unwrap()).unwrap();
        assert_eq!(json["identity"], "3");
        assert!(json["in_flight"].is_null());
    }
}
