//! # nipow-tests
//!
//! Integration tests for the nipow workspace.
//!
//! This crate provides:
//! - Generators that mine blocks to an exact depth
//! - A store-backed harness around [`nipow_consensus::ChainProver`]
//! - Scenario tests for proof construction, inclusion, joining and scoring
//! - Property-based tests for proof invariants

pub mod generators;
pub mod harness;



pub use generators::*;
pub use harness::*;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a fmt subscriber writing to the test output. `RUST_LOG` selects
/// the levels, `warn` by default.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
