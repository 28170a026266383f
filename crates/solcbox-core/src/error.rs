//! Error types for catalog lookup, sandbox hosting and verification.
//!
//! ## Error Code Ranges
//!
//! | Range | Category | Description |
//! |-------|----------|-------------|
//! | X001-X003 | Catalog | Catalog fetch, parse and version lookup |
//! | X004-X005 | Fetch | Binary module download and integrity |
//! | X006-X012 | Sandbox / serialization | Construction, invocation, lifecycle |
//! | X013 | Verify | Metadata marker encoding |
//! | X014 | Config | Configuration loading |

use thiserror::Error;

/// Errors from the transport layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {message}")]
    Read { url: String, message: String },
}

/// Errors raised by a sandbox engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SandboxError {
    /// A script failed to compile or threw while running.
    #[error("script '{name}' failed: {message}")]
    Script { name: String, message: String },

    /// The entry point expression did not yield a callable.
    #[error("entry point binding failed: {0}")]
    Binding(String),

    /// The bound entry point threw or returned a non-string value.
    #[error("entry point call failed: {0}")]
    Call(String),

    /// Execution was interrupted from another thread.
    #[error("execution terminated")]
    Terminated,
}

/// Errors from solcbox operations.
///
/// Error codes use a stable X-series format so callers and the CLI's JSON
/// output can match on them without parsing messages.
#[derive(Debug, Error)]
pub enum SolcError {
    /// X001: Release catalog could not be downloaded.
    #[error("X001: failed to fetch release catalog: {source}")]
    CatalogFetch {
        #[source]
        source: FetchError,
    },

    /// X002: Release catalog is not a valid list document.
    #[error("X002: failed to parse release catalog: {message}")]
    CatalogParse { message: String },

    /// X003: Requested version is absent from the catalog.
    #[error("X003: compiler version '{version}' not found in release catalog")]
    VersionNotFound { version: String },

    /// X004: Binary module download failed.
    #[error("X004: failed to fetch compiler {version}: {source}")]
    BinaryFetch {
        version: String,
        #[source]
        source: FetchError,
    },

    /// X005: Downloaded module does not match the catalog checksum.
    #[error("X005: checksum mismatch for compiler {version}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        version: String,
        expected: String,
        actual: String,
    },

    /// X006: Version string is not a semantic version.
    #[error("X006: invalid compiler version '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    /// X007: Module failed to load or the entry point could not be bound.
    #[error("X007: failed to initialize compiler {version}: {message}")]
    SandboxInit { version: String, message: String },

    /// X008: Request could not be converted to the sandbox's textual form.
    #[error("X008: failed to serialize compiler input: {message}")]
    Serialization { message: String },

    /// X009: Entry point raised an error.
    #[error("X009: compiler {version} invocation failed: {message}")]
    Invocation { version: String, message: String },

    /// X010: Entry point result is not a valid output document.
    #[error("X010: failed to parse compiler output: {message}")]
    Deserialization { message: String },

    /// X011: Call exceeded the configured deadline.
    #[error("X011: compiler {version} call timed out after {seconds}s")]
    Timeout { version: String, seconds: u64 },

    /// X012: Instance was closed.
    #[error("X012: compiler {version} has been closed")]
    ClosedInstance { version: String },

    /// X013: Metadata marker could not be encoded.
    #[error("X013: failed to encode metadata marker '{marker}': {message}")]
    MetadataEncoding { marker: String, message: String },

    /// X014: Configuration is unreadable or holds invalid values.
    #[error("X014: invalid configuration: {message}")]
    Config { message: String },
}

impl SolcError {
    /// Returns the error code (e.g., "X003").
    pub fn code(&self) -> &'static str {
        match self {
            SolcError::CatalogFetch { .. } => "X001",
            SolcError::CatalogParse { .. } => "X002",
            SolcError::VersionNotFound { .. } => "X003",
            SolcError::BinaryFetch { .. } => "X004",
            SolcError::IntegrityMismatch { .. } => "X005",
            SolcError::InvalidVersion { .. } => "X006",
            SolcError::SandboxInit { .. } => "X007",
            SolcError::Serialization { .. } => "X008",
            SolcError::Invocation { .. } => "X009",
            SolcError::Deserialization { .. } => "X010",
            SolcError::Timeout { .. } => "X011",
            SolcError::ClosedInstance { .. } => "X012",
            SolcError::MetadataEncoding { .. } => "X013",
            SolcError::Config { .. } => "X014",
        }
    }

    /// Returns the error category.
    pub fn category(&self) -> &'static str {
        match self {
            SolcError::CatalogFetch { .. }
            | SolcError::CatalogParse { .. }
            | SolcError::VersionNotFound { .. } => "catalog",
            SolcError::BinaryFetch { .. } | SolcError::IntegrityMismatch { .. } => "fetch",
            SolcError::InvalidVersion { .. }
            | SolcError::SandboxInit { .. }
            | SolcError::Invocation { .. }
            | SolcError::Timeout { .. }
            | SolcError::ClosedInstance { .. } => "sandbox",
            SolcError::Serialization { .. } | SolcError::Deserialization { .. } => {
                "serialization"
            }
            SolcError::MetadataEncoding { .. } => "verify",
            SolcError::Config { .. } => "config",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = SolcError> = std::result::Result<T, E>;
