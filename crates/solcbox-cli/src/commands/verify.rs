//! Verify command implementation
//!
//! Compares freshly compiled bytecode against a recorded artifact, ignoring
//! the metadata hash that solc appends.

use anyhow::{anyhow, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use solcbox_core::{MetadataPattern, SolcError};
use std::borrow::Cow;
use std::fs;
use std::process::ExitCode;

use super::json_output::{error_codes, print_json, JsonError};

/// Result of one comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyReport {
    /// Whether the bytecodes are equivalent
    pub matched: bool,
    /// Hash scheme key used to locate the metadata blob
    pub metadata_hash: String,
    /// Whether a metadata segment was found in the compiled bytecode
    pub compiled_has_metadata: bool,
    /// Whether a metadata segment was found in the reference bytecode
    pub reference_has_metadata: bool,
}

/// JSON output for the verify command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOutput {
    /// Whether the bytecodes matched
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<VerifyReport>,
}

/// Reads a bytecode argument: literal hex, or `@path` to read a file.
///
/// Surrounding whitespace and a `0x` prefix are dropped.
pub fn read_bytecode(arg: &str) -> Result<String, JsonError> {
    let (text, file) = match arg.strip_prefix('@') {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                JsonError::new(error_codes::FILE_READ, format!("Failed to read {}: {}", path, e))
                    .with_file(path)
            })?;
            (text, Some(path))
        }
        None => (arg.to_string(), None),
    };

    let trimmed = text.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = JsonError::new(error_codes::INVALID_HEX, "bytecode is not a hex string")
            .with_suggestion("pass raw hex or @path to a file containing it");
        if let Some(path) = file {
            err = err.with_file(path);
        }
        return Err(err);
    }
    Ok(hex.to_string())
}

/// Compares two hex strings under `metadata_hash`.
pub fn evaluate(compiled: &str, reference: &str, metadata_hash: &str) -> Result<VerifyReport, SolcError> {
    let pattern = MetadataPattern::new(metadata_hash)?;
    let stripped_compiled = pattern.strip(compiled);
    let stripped_reference = pattern.strip(reference);
    Ok(VerifyReport {
        matched: stripped_compiled == stripped_reference,
        metadata_hash: metadata_hash.to_string(),
        compiled_has_metadata: matches!(stripped_compiled, Cow::Owned(_)),
        reference_has_metadata: matches!(stripped_reference, Cow::Owned(_)),
    })
}

fn compare(compiled: &str, reference: &str, metadata_hash: &str) -> Result<VerifyReport, JsonError> {
    let compiled = read_bytecode(compiled)?;
    let reference = read_bytecode(reference)?;
    evaluate(&compiled, &reference, metadata_hash).map_err(|e| JsonError::from(&e))
}

/// Run the verify command.
///
/// # Arguments
/// * `compiled` - Compiled bytecode (hex or `@path`)
/// * `reference` - Reference bytecode (hex or `@path`)
/// * `metadata_hash` - Metadata hash scheme key
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 if the bytecodes match, 1 on mismatch or error
pub fn run(compiled: &str, reference: &str, metadata_hash: &str, json_output: bool) -> Result<ExitCode> {
    let result = compare(compiled, reference, metadata_hash);

    if json_output {
        let output = match result {
            Ok(report) => VerifyOutput {
                success: report.matched,
                errors: Vec::new(),
                result: Some(report),
            },
            Err(e) => VerifyOutput {
                success: false,
                errors: vec![e],
                result: None,
            },
        };
        print_json(&output)?;
        return Ok(if output.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let report = result.map_err(|e| anyhow!("{}: {}", e.code, e.message))?;
    if !report.compiled_has_metadata || !report.reference_has_metadata {
        println!(
            "{} no '{}' metadata found in {}; comparing raw bytecode",
            "WARNING".yellow().bold(),
            report.metadata_hash,
            match (report.compiled_has_metadata, report.reference_has_metadata) {
                (false, false) => "either input",
                (false, true) => "compiled bytecode",
                _ => "reference bytecode",
            }
        );
    }
    if report.matched {
        println!("{} bytecode matches", "PASSED".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} bytecode differs", "FAILED".red().bold());
        Ok(ExitCode::from(1))
    }
}
