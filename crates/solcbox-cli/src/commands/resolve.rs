//! Resolve command implementation
//!
//! Shows where the binary module for a compiler version is published.

use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use solcbox_core::fetch::join_url;
use solcbox_core::{CallConvention, CompilerVersion, ReleaseCatalog, SolcConfig, SolcError};
use std::process::ExitCode;

use super::json_output::{print_json, JsonError};
use super::{fetch_catalog, load_config};

/// A catalog build resolved for a requested version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedBuild {
    pub requested: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_version: Option<String>,
    pub path: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Entry point convention the build is driven with
    pub convention: String,
}

/// JSON output for the resolve command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResolvedBuild>,
}

/// Looks up `version` in the catalog.
pub fn resolve_build(
    catalog: &ReleaseCatalog,
    config: &SolcConfig,
    version: &str,
) -> Result<ResolvedBuild, SolcError> {
    let parsed = CompilerVersion::parse(version)?;
    let build = catalog
        .build(version)
        .ok_or_else(|| SolcError::VersionNotFound {
            version: version.trim().to_string(),
        })?;
    Ok(ResolvedBuild {
        requested: version.trim().to_string(),
        version: build.version.clone(),
        long_version: build.long_version.clone(),
        path: build.path.clone(),
        url: join_url(&config.binary_base_url, &build.path),
        sha256: build.sha256_hex(),
        convention: CallConvention::for_version(&parsed).to_string(),
    })
}

/// Run the resolve command.
///
/// # Returns
/// Exit code: 0 if the version is published, 1 otherwise
pub fn run(config_path: Option<&str>, version: &str, json_output: bool) -> Result<ExitCode> {
    let resolved = load_config(config_path).and_then(|config| {
        let catalog = fetch_catalog(&config)?;
        resolve_build(&catalog, &config, version)
    });

    if json_output {
        let output = match resolved {
            Ok(build) => ResolveOutput {
                success: true,
                errors: Vec::new(),
                result: Some(build),
            },
            Err(e) => ResolveOutput {
                success: false,
                errors: vec![JsonError::from(&e)],
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

    let build = resolved?;
    println!("{} {}", "Version:".cyan().bold(), build.version);
    if let Some(long) = &build.long_version {
        println!("{} {}", "Build:".dimmed(), long);
    }
    println!("{} {}", "Path:".dimmed(), build.path);
    println!("{} {}", "URL:".dimmed(), build.url);
    if let Some(sha) = &build.sha256 {
        println!("{} {}", "SHA-256:".dimmed(), sha);
    }
    println!("{} {}", "Entry point:".dimmed(), build.convention);
    Ok(ExitCode::SUCCESS)
}
