//! solcbox Integration Test Infrastructure
//!
//! Tests run against scripted doubles from `solcbox-core`'s `testing`
//! feature, so they need neither network access nor a script engine.
//!
//! ## Running Tests
//!
//! ```bash
//! # Offline suite
//! cargo test -p solcbox-tests
//!
//! # Real soljson builds (downloads from binaries.soliditylang.org)
//! cargo test -p solcbox-tests --features v8 -- --ignored
//! ```

pub mod fixtures;
pub mod harness;

pub use harness::{CliHarness, CliResult, RegistryHarness};
