//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `SOLCBOX_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SolcError;

/// Default release catalog location.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/ethereum/solc-bin/gh-pages/emscripten-wasm32/list.json";

/// Default base URL for binary modules.
pub const DEFAULT_BINARY_BASE_URL: &str = "https://binaries.soliditylang.org/emscripten-wasm32";

/// Default HTTP timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 120;

/// Configuration for catalog access, fetching and sandbox hosting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolcConfig {
    /// URL of the release catalog (`list.json`).
    pub catalog_url: String,
    /// Base URL that catalog `path` entries are relative to.
    pub binary_base_url: String,
    /// HTTP timeout for catalog and binary downloads.
    pub fetch_timeout_seconds: u64,
    /// Per-call compile timeout. Unset by default, so a call waits as long
    /// as the compiler needs.
    pub compile_timeout_seconds: Option<u64>,
    /// Check downloaded modules against the catalog's SHA-256.
    pub verify_checksums: bool,
    /// Heap cap for each sandbox, if the engine supports one.
    pub heap_limit_mb: Option<usize>,
}

impl Default for SolcConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            binary_base_url: DEFAULT_BINARY_BASE_URL.to_string(),
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECONDS,
            compile_timeout_seconds: None,
            verify_checksums: true,
            heap_limit_mb: None,
        }
    }
}

impl SolcConfig {
    /// Default config file location (`<config dir>/solcbox/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("solcbox").join("config.json"))
    }

    /// Reads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, SolcError> {
        let content = std::fs::read_to_string(path).map_err(|e| SolcError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| SolcError::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Loads the full layered configuration.
    ///
    /// An explicit `path` must exist; the default location is used only when
    /// present.
    pub fn load(path: Option<&Path>) -> Result<Self, SolcError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `SOLCBOX_*` overrides read through `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SolcError> {
        if let Some(url) = lookup("SOLCBOX_CATALOG_URL") {
            self.catalog_url = url;
        }
        if let Some(url) = lookup("SOLCBOX_BINARY_BASE_URL") {
            self.binary_base_url = url;
        }
        if let Some(raw) = lookup("SOLCBOX_FETCH_TIMEOUT") {
            self.fetch_timeout_seconds = parse_env("SOLCBOX_FETCH_TIMEOUT", &raw)?;
        }
        if let Some(raw) = lookup("SOLCBOX_COMPILE_TIMEOUT") {
            // 0 disables the timeout
            let seconds: u64 = parse_env("SOLCBOX_COMPILE_TIMEOUT", &raw)?;
            self.compile_timeout_seconds = (seconds > 0).then_some(seconds);
        }
        if let Some(raw) = lookup("SOLCBOX_VERIFY_CHECKSUMS") {
            self.verify_checksums = parse_env("SOLCBOX_VERIFY_CHECKSUMS", &raw)?;
        }
        Ok(self)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn compile_timeout(&self) -> Option<Duration> {
        self.compile_timeout_seconds.map(Duration::from_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SolcError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| SolcError::Config {
        message: format!("{}={:?}: {}", key, raw, e),
    })
}
