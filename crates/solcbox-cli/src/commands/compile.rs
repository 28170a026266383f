//! Compile command implementation
//!
//! Loads one compiler release into a V8 sandbox and runs a standard-JSON
//! input through it.

use anyhow::{Context, Result};
use colored::Colorize;
use solcbox_core::{CompilerInput, CompilerRegistry, V8SandboxFactory};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use super::load_config;

/// Run the compile command.
///
/// # Arguments
/// * `config_path` - Optional explicit config file
/// * `solc_version` - Exact compiler version to use
/// * `input_path` - Standard-JSON input file
/// * `output_path` - Output file (default: stdout)
/// * `pretty` - Pretty-print the output JSON
///
/// # Returns
/// Exit code: 0 on success, 1 if the compiler reported errors
pub fn run(
    config_path: Option<&str>,
    solc_version: &str,
    input_path: &str,
    output_path: Option<&str>,
    pretty: bool,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;

    let content = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read input file: {}", input_path))?;
    let input: CompilerInput = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse standard-JSON input: {}", input_path))?;

    let mut factory = V8SandboxFactory::new();
    if let Some(mb) = config.heap_limit_mb {
        factory = factory.with_heap_limit_mb(mb);
    }
    let registry = CompilerRegistry::bootstrap(config, Arc::new(factory))
        .context("Failed to load release catalog")?;

    eprintln!("{} solc {}", "Compiling with".cyan().bold(), solc_version);
    let compiler = registry.get_compiler(solc_version)?;
    let output = compiler.compile(&input);
    drop(compiler);
    registry.close_all();
    let output = output?;

    for diagnostic in &output.errors {
        let text = diagnostic
            .formatted_message
            .as_deref()
            .unwrap_or(&diagnostic.message);
        if diagnostic.is_error() {
            eprintln!("{}: {}", "error".red().bold(), text.trim_end());
        } else {
            eprintln!("{}: {}", diagnostic.severity.yellow(), text.trim_end());
        }
    }

    let text = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("Failed to serialize compiler output")?;

    match output_path {
        Some(path) => {
            fs::write(Path::new(path), text)
                .with_context(|| format!("Failed to write output file: {}", path))?;
            eprintln!("{} {}", "Wrote".green().bold(), path);
        }
        None => println!("{}", text),
    }

    if output.has_errors() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
