//! solcbox CLI library.
//!
//! Command implementations and logging setup for the `solcbox` binary. The
//! commands are exposed here so they can be exercised without spawning a
//! process.

pub mod commands;
pub mod logging;
