//! Release catalog (`list.json`) snapshot.
//!
//! The catalog is fetched once and never refreshed. It answers two questions:
//! which release tags exist, and where the binary for an exact version lives.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::SolcError;
use crate::fetch::BinaryFetcher;

/// One entry of the catalog's `builds` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub path: String,
    pub version: String,
    #[serde(default)]
    pub long_version: Option<String>,
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub prerelease: Option<String>,
    #[serde(default)]
    pub keccak256: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl BuildInfo {
    /// The catalog's SHA-256 as lowercase hex without `0x`.
    pub fn sha256_hex(&self) -> Option<String> {
        self.sha256.as_deref().map(|s| {
            s.strip_prefix("0x")
                .unwrap_or(s)
                .to_ascii_lowercase()
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseIndex {
    #[serde(default)]
    builds: Vec<BuildInfo>,
    #[serde(default)]
    releases: BTreeMap<String, String>,
    #[serde(default)]
    latest_release: Option<String>,
}

/// Immutable view of the remote release catalog.
#[derive(Debug)]
pub struct ReleaseCatalog {
    index: ReleaseIndex,
}

impl ReleaseCatalog {
    /// Downloads and parses the catalog.
    pub fn fetch(fetcher: &dyn BinaryFetcher, url: &str) -> Result<Self, SolcError> {
        let body = fetcher
            .fetch(url)
            .map_err(|source| SolcError::CatalogFetch { source })?;
        let text = String::from_utf8(body).map_err(|e| SolcError::CatalogParse {
            message: format!("catalog is not UTF-8: {}", e),
        })?;
        let catalog = Self::from_json(&text)?;
        tracing::info!(
            url,
            builds = catalog.index.builds.len(),
            releases = catalog.index.releases.len(),
            "release catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses a catalog document.
    pub fn from_json(json: &str) -> Result<Self, SolcError> {
        let index: ReleaseIndex =
            serde_json::from_str(json).map_err(|e| SolcError::CatalogParse {
                message: e.to_string(),
            })?;
        Ok(Self { index })
    }

    /// Release tag -> version string mapping. Identical on every call.
    pub fn release_version_list(&self) -> &BTreeMap<String, String> {
        &self.index.releases
    }

    /// Binary path for an exact version, or `None` if the catalog lacks it.
    pub fn resolve_binary_path(&self, version: &str) -> Option<&str> {
        self.build(version).map(|b| b.path.as_str())
    }

    /// Build entry for a version, matched on `version` first and then on
    /// `longVersion`. The first match in list order wins.
    pub fn build(&self, version: &str) -> Option<&BuildInfo> {
        let version = version.trim();
        self.index
            .builds
            .iter()
            .find(|b| b.version == version)
            .or_else(|| {
                self.index
                    .builds
                    .iter()
                    .find(|b| b.long_version.as_deref() == Some(version))
            })
    }

    pub fn builds(&self) -> &[BuildInfo] {
        &self.index.builds
    }

    pub fn latest_release(&self) -> Option<&str> {
        self.index.latest_release.as_deref()
    }
}
