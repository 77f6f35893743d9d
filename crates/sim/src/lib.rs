//! Piconet Sim - an in-memory radio for many nodes in one process
//!
//! [`RadioBus`] plays the part of the platform radio stack for any number of
//! [`SimRadio`]s. [`Simulation`] puts a [`MeshNode`](piconet_mesh::MeshNode)
//! with a [`RecordingMotion`] drivetrain on each radio and adds the app that
//! connects to the root and writes commands.

#![warn(missing_docs)]

pub mod bus;
pub mod error;
pub mod motion;
pub mod simulation;

pub use bus::{NodeId, RadioBus, SimLink, SimRadio, SIM_COMMAND_ATTRIBUTE};
pub use error::{SimError, SimResult};
pub use motion::{MotionCall, RecordingMotion};
pub use simulation::{Simulation, DEFAULT_SETTLE_STEPS};
