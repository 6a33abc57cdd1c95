//! Shared test fixtures for SolverForge crates.
//!
//! This crate provides a recording sink and small fact types for testing.
//! It does NOT depend on `solverforge-network` to avoid circular dependencies.
//!
//! - [`recording`] - A terminal consumer that records every event it receives
//! - [`fixtures`] - Shift and employee fact types
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! solverforge-test = { workspace = true }
//! ```
//!
//! Then import what you need:
//!
//! ```ignore
//! use solverforge_test::{EventKind, RecordingLifecycle};
//! use solverforge_test::fixtures::Shift;
//! ```

pub mod fixtures;
pub mod recording;

pub use fixtures::{Employee, Shift};
pub use recording::{Event, EventKind, RecordingLifecycle};

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
/// The filter is read from `RUST_LOG`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
