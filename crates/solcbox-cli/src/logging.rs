//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,solcbox_core=info";

/// Builds the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// `--verbose` raises solcbox's own targets to `debug`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,solcbox_core=debug,solcbox_cli=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    })
}

/// Installs the global subscriber. Logs go to stderr so stdout stays
/// parseable.
pub fn init_logging(verbose: bool) {
    fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
