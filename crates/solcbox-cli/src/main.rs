//! solcbox CLI - Command-line interface for sandboxed solc releases
//!
//! Lists and resolves releases from the catalog, compiles standard-JSON
//! input with an exact release, and verifies bytecode against recorded
//! artifacts.

use clap::Parser;
use std::process::ExitCode;

use solcbox_cli::{commands, logging};

mod cli_args;

use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Releases { json } => commands::releases::run(config, json),
        Commands::Resolve { solc_version, json } => {
            commands::resolve::run(config, &solc_version, json)
        }
        #[cfg(feature = "v8")]
        Commands::Compile {
            solc_version,
            input,
            output,
            pretty,
        } => commands::compile::run(config, &solc_version, &input, output.as_deref(), pretty),
        Commands::Verify {
            compiled,
            reference,
            metadata_hash,
            json,
        } => commands::verify::run(&compiled, &reference, &metadata_hash, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
