//! Releases command implementation
//!
//! Lists the published compiler releases from the release catalog.

use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use solcbox_core::{CompilerVersion, ReleaseCatalog};
use std::cmp::Ordering;
use std::process::ExitCode;

use super::json_output::{print_json, JsonError};
use super::{fetch_catalog, load_config};

/// One published release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseEntry {
    /// Release tag (e.g. "0.8.17")
    pub version: String,
    /// Binary module file name
    pub path: String,
}

/// JSON output for the releases command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasesOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_release: Option<String>,
    /// Every build in the catalog, nightlies included
    pub build_count: usize,
    pub releases: Vec<ReleaseEntry>,
}

/// Releases newest first. Tags that are not semantic versions sort last.
pub fn sorted_releases(catalog: &ReleaseCatalog) -> Vec<ReleaseEntry> {
    let mut entries: Vec<ReleaseEntry> = catalog
        .release_version_list()
        .iter()
        .map(|(version, path)| ReleaseEntry {
            version: version.clone(),
            path: path.clone(),
        })
        .collect();
    entries.sort_by(|a, b| {
        match (
            CompilerVersion::parse(&a.version),
            CompilerVersion::parse(&b.version),
        ) {
            (Ok(a), Ok(b)) => b.cmp(&a),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.version.cmp(&b.version),
        }
    });
    entries
}

/// Run the releases command.
///
/// # Arguments
/// * `config_path` - Optional explicit config file
/// * `json_output` - Whether to output machine-readable JSON
pub fn run(config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    let catalog = load_config(config_path).and_then(|config| fetch_catalog(&config));

    if json_output {
        let output = match &catalog {
            Ok(catalog) => ReleasesOutput {
                success: true,
                errors: Vec::new(),
                latest_release: catalog.latest_release().map(str::to_string),
                build_count: catalog.builds().len(),
                releases: sorted_releases(catalog),
            },
            Err(e) => ReleasesOutput {
                success: false,
                errors: vec![JsonError::from(e)],
                latest_release: None,
                build_count: 0,
                releases: Vec::new(),
            },
        };
        print_json(&output)?;
        return Ok(if output.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let catalog = catalog?;
    let releases = sorted_releases(&catalog);
    if let Some(latest) = catalog.latest_release() {
        println!("{} {}", "Latest release:".cyan().bold(), latest);
    }
    println!(
        "{} {} {}",
        "Releases:".cyan().bold(),
        releases.len(),
        format!("({} builds in catalog)", catalog.builds().len()).dimmed()
    );
    for entry in &releases {
        println!("  {:<10} {}", entry.version.green(), entry.path.dimmed());
    }
    Ok(ExitCode::SUCCESS)
}
