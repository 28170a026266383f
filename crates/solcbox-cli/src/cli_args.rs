//! CLI argument definitions for the solcbox command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};
use solcbox_core::DEFAULT_METADATA_HASH;

/// solcbox - Sandboxed multi-version Solidity compiler host
#[derive(Parser)]
#[command(name = "solcbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Path to a JSON config file (default: <config dir>/solcbox/config.json)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List published compiler releases
    Releases {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Show where the binary for a compiler version is published
    Resolve {
        /// Exact compiler version (e.g. 0.8.17)
        #[arg(value_name = "VERSION")]
        solc_version: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Compile a standard-JSON input with a specific compiler release
    #[cfg(feature = "v8")]
    Compile {
        /// Exact compiler version (e.g. 0.8.17)
        #[arg(long)]
        solc_version: String,

        /// Path to the standard-JSON input file
        #[arg(short, long)]
        input: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Pretty-print the output JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Compare two bytecodes, ignoring the metadata hash
    Verify {
        /// Compiled bytecode as hex, or @path to a file containing it
        #[arg(long)]
        compiled: String,

        /// Reference bytecode as hex, or @path to a file containing it
        #[arg(long)]
        reference: String,

        /// Metadata hash scheme key (ipfs, bzzr0, bzzr1)
        #[arg(long = "hash", default_value = DEFAULT_METADATA_HASH)]
        metadata_hash: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}
