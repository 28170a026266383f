//! Shared catalog and bytecode fixtures.

use solcbox_core::fetch::join_url;
use solcbox_core::testing::{StaticFetcher, FAKE_MODULE};
use solcbox_core::SolcConfig;

/// Base URL the fixture catalog's binaries are served from.
pub const BINARY_BASE_URL: &str = "https://binaries.test/emscripten-wasm32";

/// Fixture catalog location.
pub const CATALOG_URL: &str = "https://catalog.test/list.json";

/// `(version, longVersion, path)` for every fixture build, oldest first.
pub const BUILDS: &[(&str, &str, &str)] = &[
    (
        "0.4.9",
        "0.4.9+commit.364da425",
        "soljson-v0.4.9+commit.364da425.js",
    ),
    (
        "0.5.3",
        "0.5.3+commit.10d17f24",
        "soljson-v0.5.3+commit.10d17f24.js",
    ),
    (
        "0.6.0",
        "0.6.0+commit.26b70077",
        "soljson-v0.6.0+commit.26b70077.js",
    ),
    (
        "0.8.17",
        "0.8.17+commit.8df45f5f",
        "soljson-v0.8.17+commit.8df45f5f.js",
    ),
];

/// Hex of CBOR `"ipfs"`.
pub const IPFS_MARKER: &str = "6469706673";

/// Hex of CBOR `"solc"`.
pub const SOLC_MARKER: &str = "64736f6c63";

/// Release catalog document covering [`BUILDS`] plus one nightly.
pub fn catalog_json() -> String {
    let mut builds: Vec<serde_json::Value> = BUILDS
        .iter()
        .map(|(version, long_version, path)| {
            serde_json::json!({
                "path": path,
                "version": version,
                "longVersion": long_version,
                "build": long_version.split('+').nth(1).unwrap_or_default(),
            })
        })
        .collect();
    builds.push(serde_json::json!({
        "path": "soljson-v0.8.18-nightly.2022.11.23+commit.eb2f874e.js",
        "version": "0.8.18",
        "prerelease": "nightly.2022.11.23",
        "build": "commit.eb2f874e",
        "longVersion": "0.8.18-nightly.2022.11.23+commit.eb2f874e",
    }));
    let releases: serde_json::Map<String, serde_json::Value> = BUILDS
        .iter()
        .map(|(version, _, path)| (version.to_string(), serde_json::json!(path)))
        .collect();
    serde_json::json!({
        "builds": builds,
        "releases": releases,
        "latestRelease": "0.8.17",
    })
    .to_string()
}

/// URL a fixture build is fetched from.
pub fn binary_url(version: &str) -> String {
    let path = BUILDS
        .iter()
        .find(|(v, _, _)| *v == version)
        .map(|(_, _, path)| *path)
        .unwrap_or("missing.js");
    join_url(BINARY_BASE_URL, path)
}

/// Fetcher serving the catalog and every fixture build.
pub fn fetcher() -> StaticFetcher {
    BUILDS.iter().fold(
        StaticFetcher::new().with_body(CATALOG_URL, catalog_json()),
        |fetcher, (version, _, _)| fetcher.with_body(binary_url(version), FAKE_MODULE),
    )
}

/// Config pointing at the fixture URLs with no compile timeout.
pub fn config() -> SolcConfig {
    SolcConfig {
        catalog_url: CATALOG_URL.to_string(),
        binary_base_url: BINARY_BASE_URL.to_string(),
        compile_timeout_seconds: None,
        ..SolcConfig::default()
    }
}

/// Runtime bytecode followed by an `ipfs` metadata map.
///
/// `hash` is the 34-byte multihash as hex.
pub fn bytecode_with_metadata(code: &str, hash: &str) -> String {
    format!(
        "{}a2{}5822{}{}43000811{}",
        code, IPFS_MARKER, hash, SOLC_MARKER, "0033"
    )
}

/// A 34-byte sha2-256 multihash filled with one byte value.
pub fn multihash(fill: u8) -> String {
    format!("1220{}", format!("{:02x}", fill).repeat(32))
}
