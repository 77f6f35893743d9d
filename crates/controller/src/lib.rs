//! Piconet Controller - the operator side of the mesh
//!
//! The controller talks to the root node only. It turns operator intent
//! (drive unit 3 to that point on the map) into a command packet, keeps at
//! most one command in flight per unit, and dead-reckons unit poses from the
//! acks that climb back out of the tree.
//!
//! # Examples
//!
//! ```
//! use piconet_controller::{Controller, Position};
//! use piconet_core::NodeIdentity;
//!
//! let mut controller = Controller::new();
//! let unit = NodeIdentity::Number(3);
//! controller.add_unit(unit.clone(), Position::new(100.0, 100.0), 0.0).unwrap();
//!
//! let plan = controller.plan_to(&unit, Position::new(100.0, 400.0)).unwrap();
//! let packet = controller.send(&unit, plan).unwrap();
//! assert_eq!(packet.as_bytes(), &[0x00, 3, 1, 90, 0x01, 0x2C]);
//!
//! controller.on_ack(&[0x00, 3]).unwrap();
//! assert!(!controller.unit(&unit).unwrap().is_busy());
//! ```

#![warn(missing_docs)]

pub mod controller;
pub mod error;
pub mod heading;
pub mod plan;

pub use controller::{Controller, UnitState};
pub use error::{ControllerError, ControllerResult};
pub use heading::{bearing_delta, Position};
pub use plan::MovePlan;
