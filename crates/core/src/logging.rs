//! Structured logging infrastructure for piconet nodes.
//!
//! Every component logs through `tracing` with structured fields
//! (`node`, `handle`, `peer`, `bytes`); this module installs the subscriber.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the logging system with human-readable output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use piconet_core::logging;
///
/// logging::init();
/// tracing::info!(node = "3", "Node started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .init();
}

/// Initialize the logging system with JSON output.
///
/// Suitable when node logs are collected and analysed offline.
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true))
        .init();
}

/// Install a subscriber for tests; safe to call more than once.
pub fn init_for_tests() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_test_writer())
        .try_init();
}
