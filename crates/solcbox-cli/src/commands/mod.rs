//! CLI command implementations

pub mod json_output;
pub mod releases;
pub mod resolve;
pub mod verify;

#[cfg(feature = "v8")]
pub mod compile;

use solcbox_core::{HttpFetcher, ReleaseCatalog, SolcConfig, SolcError};
use std::path::Path;

/// Loads configuration, honouring `--config` when given.
pub fn load_config(path: Option<&str>) -> Result<SolcConfig, SolcError> {
    let config = SolcConfig::load(path.map(Path::new))?;
    tracing::debug!(
        catalog_url = %config.catalog_url,
        binary_base_url = %config.binary_base_url,
        "configuration loaded"
    );
    Ok(config)
}

/// Downloads the release catalog named by `config`.
pub fn fetch_catalog(config: &SolcConfig) -> Result<ReleaseCatalog, SolcError> {
    let fetcher = HttpFetcher::new(config.fetch_timeout());
    ReleaseCatalog::fetch(&fetcher, &config.catalog_url)
}
