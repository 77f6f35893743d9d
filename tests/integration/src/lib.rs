//! Integration tests for multi-node piconets
//!
//! This test suite drives whole trees over the in-memory radio bus:
//! - Tree formation under the child-capacity limit
//! - Multi-hop command delivery and hop-by-hop ack return
//! - Dead-end absorption of commands for absent targets
//! - Child churn and orphaned sub-trees
//! - The operator controller on top of the root

pub mod test_utils;

#[cfg(test)]
mod tree_formation_tests;

#[cfg(test)]
mod command_routing_tests;

#[cfg(test)]
mod churn_tests;

#[cfg(test)]
mod controller_tests;
