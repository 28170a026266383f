//! Test harness utilities for driving the registry and the CLI.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

use solcbox_core::testing::{ScriptedSandboxFactory, StaticFetcher};
use solcbox_core::CompilerRegistry;

use crate::fixtures;

/// A registry bootstrapped against the fixture catalog, with handles on the
/// doubles behind it.
pub struct RegistryHarness {
    pub registry: Arc<CompilerRegistry>,
    pub fetcher: Arc<StaticFetcher>,
    pub factory: Arc<ScriptedSandboxFactory>,
}

impl RegistryHarness {
    /// Fixture fetcher and a default scripted engine.
    pub fn new() -> Self {
        Self::with(fixtures::fetcher(), ScriptedSandboxFactory::new())
    }

    pub fn with_factory(factory: ScriptedSandboxFactory) -> Self {
        Self::with(fixtures::fetcher(), factory)
    }

    pub fn with(fetcher: StaticFetcher, factory: ScriptedSandboxFactory) -> Self {
        let fetcher = Arc::new(fetcher);
        let factory = Arc::new(factory);
        let registry =
            CompilerRegistry::bootstrap_with(fixtures::config(), fetcher.clone(), factory.clone())
                .expect("fixture catalog should load");
        Self {
            registry: Arc::new(registry),
            fetcher,
            factory,
        }
    }

    /// Number of times the binary for `version` was downloaded.
    pub fn binary_fetches(&self, version: &str) -> usize {
        self.fetcher.hits(&fixtures::binary_url(version))
    }
}

impl Default for RegistryHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of running the solcbox CLI.
#[derive(Debug)]
pub struct CliResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    /// Create a CliResult from a Command Output.
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Parses stdout as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({}):\n{}", e, self.stdout))
    }
}

/// Runs CLI commands from a scratch directory.
pub struct CliHarness {
    pub work_dir: TempDir,
}

impl CliHarness {
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().expect("Failed to create work dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }

    /// Runs `solcbox` through cargo with the given arguments.
    pub fn run_cli(&self, args: &[&str]) -> CliResult {
        let output = Command::new("cargo")
            .args(["run", "--quiet", "--manifest-path"])
            .arg(workspace_manifest_path())
            .args(["-p", "solcbox-cli", "--"])
            .args(args)
            .current_dir(self.path())
            .output();

        match output {
            Ok(out) => CliResult::from_output(out),
            Err(e) => CliResult {
                success: false,
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("Failed to run CLI: {}", e),
            },
        }
    }
}

impl Default for CliHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn workspace_manifest_path() -> PathBuf {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let manifest_path = manifest_dir.join("..").join("..").join("Cargo.toml");
        manifest_path.canonicalize().unwrap_or(manifest_path)
    })
    .clone()
}
