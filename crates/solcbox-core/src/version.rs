//! Compiler version parsing.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::SolcError;

/// First release line that exports `solidity_compile`.
pub const SOLIDITY_COMPILE_SINCE: Version = Version::new(0, 5, 0);

/// First release line whose `solidity_compile` takes an import callback.
pub const IMPORT_CALLBACK_SINCE: Version = Version::new(0, 6, 0);

/// A parsed compiler version.
///
/// Accepts `0.8.17`, `v0.8.17`, `0.8.17+commit.8df45f5f` and nightly
/// pre-release tags. The original string is kept for display and cache keys.
#[derive(Debug, Clone)]
pub struct CompilerVersion {
    raw: String,
    version: Version,
}

impl CompilerVersion {
    /// Parses a version string.
    pub fn parse(raw: &str) -> Result<Self, SolcError> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let version = Version::parse(bare).map_err(|e| SolcError::InvalidVersion {
            version: raw.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            raw: trimmed.to_string(),
            version,
        })
    }

    /// The string this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The underlying semantic version.
    pub fn semver(&self) -> &Version {
        &self.version
    }

    /// `major.minor.patch` without pre-release or build metadata.
    pub fn short(&self) -> String {
        format!(
            "{}.{}.{}",
            self.version.major, self.version.minor, self.version.patch
        )
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }
}

impl PartialEq for CompilerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for CompilerVersion {}

impl PartialOrd for CompilerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompilerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl FromStr for CompilerVersion {
    type Err = SolcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
