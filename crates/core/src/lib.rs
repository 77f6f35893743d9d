//! Core functionality for the piconet control mesh.
//!
//! This crate provides the identity and connection types, configuration
//! and logging setup shared by the radio, mesh and controller crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{Config, NodeConfig, RadioConfig, CHILD_CAPACITY};
pub use error::{CoreError, Result};
pub use types::{ConnectionHandle, NodeIdentity, MAX_NAME_LEN};
