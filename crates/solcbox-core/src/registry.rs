//! Process-wide cache of loaded compiler versions.
//!
//! Each version gets a slot on first request. The slot's own mutex is held
//! while the module is fetched and loaded, so concurrent first requests for
//! one version share a single fetch while different versions load in
//! parallel. Failed loads leave the slot empty; the next caller retries.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Instant;

use crate::catalog::ReleaseCatalog;
use crate::compiler::{SandboxOptions, SandboxedCompiler};
use crate::config::SolcConfig;
use crate::error::SolcError;
use crate::fetch::{join_url, BinaryFetcher, HttpFetcher};
use crate::sandbox::SandboxFactory;
use crate::version::CompilerVersion;

type Slot = Arc<Mutex<Option<Arc<SandboxedCompiler>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Version-keyed cache of [`SandboxedCompiler`] instances.
pub struct CompilerRegistry {
    catalog: Arc<ReleaseCatalog>,
    fetcher: Arc<dyn BinaryFetcher>,
    factory: Arc<dyn SandboxFactory>,
    config: SolcConfig,
    slots: Mutex<HashMap<String, Slot>>,
}

impl CompilerRegistry {
    pub fn new(
        catalog: ReleaseCatalog,
        fetcher: Arc<dyn BinaryFetcher>,
        factory: Arc<dyn SandboxFactory>,
        config: SolcConfig,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            fetcher,
            factory,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the release catalog over HTTP and returns a ready registry.
    ///
    /// A catalog failure is returned as-is; callers treat it as fatal.
    pub fn bootstrap(config: SolcConfig, factory: Arc<dyn SandboxFactory>) -> Result<Self, SolcError> {
        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout()));
        Self::bootstrap_with(config, fetcher, factory)
    }

    /// Same as [`CompilerRegistry::bootstrap`] with a caller-supplied fetcher.
    pub fn bootstrap_with(
        config: SolcConfig,
        fetcher: Arc<dyn BinaryFetcher>,
        factory: Arc<dyn SandboxFactory>,
    ) -> Result<Self, SolcError> {
        let catalog = ReleaseCatalog::fetch(fetcher.as_ref(), &config.catalog_url)?;
        Ok(Self::new(catalog, fetcher, factory, config))
    }

    /// Returns the compiler for `version`, loading it on first use.
    ///
    /// Repeated calls for the same version return the same instance without
    /// touching the network.
    pub fn get_compiler(&self, version: &str) -> Result<Arc<SandboxedCompiler>, SolcError> {
        let key = version.trim().to_string();
        // unknown versions never get a slot
        if self.catalog.build(&key).is_none() {
            let err = SolcError::VersionNotFound { version: key };
            tracing::warn!(code = err.code(), "failed to load compiler: {}", err);
            return Err(err);
        }
        let slot = lock(&self.slots).entry(key.clone()).or_default().clone();

        let mut cached = lock(&*slot);
        if let Some(compiler) = cached.as_ref() {
            tracing::debug!(version = %key, "compiler cache hit");
            return Ok(compiler.clone());
        }

        let started = Instant::now();
        let compiler = match self.load(&key) {
            Ok(compiler) => Arc::new(compiler),
            Err(e) => {
                tracing::warn!(version = %key, code = e.code(), "failed to load compiler: {}", e);
                return Err(e);
            }
        };
        tracing::info!(
            version = %key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compiler loaded"
        );
        *cached = Some(compiler.clone());
        Ok(compiler)
    }

    fn load(&self, version: &str) -> Result<SandboxedCompiler, SolcError> {
        let build = self
            .catalog
            .build(version)
            .ok_or_else(|| SolcError::VersionNotFound {
                version: version.to_string(),
            })?;

        let url = join_url(&self.config.binary_base_url, &build.path);
        tracing::info!(version, url = %url, "fetching compiler module");
        let module = self
            .fetcher
            .fetch(&url)
            .map_err(|source| SolcError::BinaryFetch {
                version: version.to_string(),
                source,
            })?;

        if self.config.verify_checksums {
            if let Some(expected) = build.sha256_hex() {
                let actual = hex::encode(Sha256::digest(&module));
                if actual != expected {
                    return Err(SolcError::IntegrityMismatch {
                        version: version.to_string(),
                        expected,
                        actual,
                    });
                }
            }
        }

        SandboxedCompiler::new(
            module,
            version,
            self.factory.clone(),
            SandboxOptions::from_config(&self.config),
        )
    }

    /// Release tag -> version string mapping from the catalog.
    pub fn release_version_list(&self) -> &BTreeMap<String, String> {
        self.catalog.release_version_list()
    }

    pub fn catalog(&self) -> &ReleaseCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SolcConfig {
        &self.config
    }

    /// Versions with a loaded instance, oldest first. Loads still in
    /// progress are not listed.
    pub fn cached_versions(&self) -> Vec<String> {
        let slots: Vec<(String, Slot)> = lock(&self.slots)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut versions: Vec<String> = slots
            .into_iter()
            .filter(|(_, slot)| match slot.try_lock() {
                Ok(cached) => cached.is_some(),
                Err(TryLockError::Poisoned(p)) => p.into_inner().is_some(),
                Err(TryLockError::WouldBlock) => false,
            })
            .map(|(version, _)| version)
            .collect();
        versions.sort_by(|a, b| {
            match (CompilerVersion::parse(a), CompilerVersion::parse(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        });
        versions
    }

    pub fn len(&self) -> usize {
        self.cached_versions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes and evicts every loaded compiler. Returns how many were closed.
    ///
    /// Handles already given out stay valid but fail with `ClosedInstance`.
    pub fn close_all(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).drain().map(|(_, slot)| slot).collect();
        let mut closed = 0;
        for slot in slots {
            if let Some(compiler) = lock(&*slot).take() {
                compiler.close();
                closed += 1;
            }
        }
        tracing::debug!(closed, "compiler registry cleared");
        closed
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("engine", &self.factory.name())
            .field("cached", &self.cached_versions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog_json, ScriptedSandboxFactory, StaticFetcher, FAKE_MODULE};
    use pretty_assertions::assert_eq;

    const BASE: &str = "https://bin.test";

    fn config() -> SolcConfig {
        SolcConfig {
            catalog_url: format!("{}/list.json", BASE),
            binary_base_url: BASE.to_string(),
            ..SolcConfig::default()
        }
    }

    fn setup(fetcher: StaticFetcher, catalog: &str) -> (CompilerRegistry, Arc<StaticFetcher>) {
        let fetcher = Arc::new(fetcher);
        let registry = CompilerRegistry::new(
            ReleaseCatalog::from_json(catalog).unwrap(),
            fetcher.clone(),
            Arc::new(ScriptedSandboxFactory::new()),
            config(),
        );
        (registry, fetcher)
    }

    #[test]
    fn test_same_version_is_cached() {
        let (registry, fetcher) = setup(
            StaticFetcher::new().with_body(format!("{}/soljson-a.js", BASE), FAKE_MODULE),
            &catalog_json(&[("0.8.17", "soljson-a.js")]),
        );
        let first = registry.get_compiler("0.8.17").unwrap();
        let second = registry.get_compiler(" 0.8.17 ").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.total_hits(), 1);
        assert_eq!(registry.cached_versions(), vec!["0.8.17".to_string()]);
    }

    #[test]
    fn test_unknown_version_skips_network() {
        let (registry, fetcher) = setup(StaticFetcher::new(), &catalog_json(&[]));
        let err = registry.get_compiler("0.9.99").unwrap_err();
        assert_eq!(err.code(), "X003");
        assert_eq!(fetcher.total_hits(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_versions_leave_no_slots() {
        let (registry, _) = setup(
            StaticFetcher::new().with_body(format!("{}/soljson-a.js", BASE), FAKE_MODULE),
            &catalog_json(&[("0.8.17", "soljson-a.js")]),
        );
        for junk in ["0.9.99", "0.8.17x", "latest", ""] {
            assert_eq!(registry.get_compiler(junk).unwrap_err().code(), "X003");
        }
        assert!(lock(&registry.slots).is_empty());

        registry.get_compiler("0.8.17").unwrap();
        assert_eq!(lock(&registry.slots).len(), 1);
    }

    #[test]
    fn test_fetch_failure_is_not_cached() {
        let url = format!("{}/soljson-a.js", BASE);
        let (registry, fetcher) = setup(
            StaticFetcher::new().with_status(url.clone(), 503),
            &catalog_json(&[("0.8.17", "soljson-a.js")]),
        );
        for _ in 0..2 {
            let err = registry.get_compiler("0.8.17").unwrap_err();
            assert_eq!(err.code(), "X004");
        }
        assert_eq!(fetcher.hits(&url), 2);
        assert!(registry.is_empty());
    }

    fn catalog_with_sha(sha256: &str) -> String {
        format!(
            r#"{{"builds":[{{"path":"soljson-a.js","version":"0.8.17","sha256":"{}"}}],"releases":{{"0.8.17":"soljson-a.js"}}}}"#,
            sha256
        )
    }

    #[test]
    fn test_checksum_mismatch() {
        let (registry, _) = setup(
            StaticFetcher::new().with_body(format!("{}/soljson-a.js", BASE), FAKE_MODULE),
            &catalog_with_sha("0xdeadbeef"),
        );
        let err = registry.get_compiler("0.8.17").unwrap_err();
        assert_eq!(err.code(), "X005");
    }

    #[test]
    fn test_checksum_match() {
        let digest = hex::encode(Sha256::digest(FAKE_MODULE.as_bytes()));
        let (registry, _) = setup(
            StaticFetcher::new().with_body(format!("{}/soljson-a.js", BASE), FAKE_MODULE),
            &catalog_with_sha(&format!("0x{}", digest.to_uppercase())),
        );
        assert!(registry.get_compiler("0.8.17").is_ok());
    }

    #[test]
    fn test_checksum_check_can_be_disabled() {
        let fetcher = Arc::new(
            StaticFetcher::new().with_body(format!("{}/soljson-a.js", BASE), FAKE_MODULE),
        );
        let registry = CompilerRegistry::new(
            ReleaseCatalog::from_json(&catalog_with_sha("0xdeadbeef")).unwrap(),
            fetcher,
            Arc::new(ScriptedSandboxFactory::new()),
            SolcConfig {
                verify_checksums: false,
                ..config()
            },
        );
        assert!(registry.get_compiler("0.8.17").is_ok());
    }

    #[test]
    fn test_close_all_closes_handed_out_instances() {
        let (registry, fetcher) = setup(
            StaticFetcher::new().with_body(format!("{}/soljson-a.js", BASE), FAKE_MODULE),
            &catalog_json(&[("0.8.17", "soljson-a.js")]),
        );
        let compiler = registry.get_compiler("0.8.17").unwrap();
        assert_eq!(registry.close_all(), 1);
        assert!(compiler.is_closed());
        assert!(registry.is_empty());

        let reloaded = registry.get_compiler("0.8.17").unwrap();
        assert!(!Arc::ptr_eq(&compiler, &reloaded));
        assert_eq!(fetcher.total_hits(), 2);
    }

    #[test]
    fn test_bootstrap_propagates_catalog_failure() {
        let fetcher = Arc::new(StaticFetcher::new().with_status(format!("{}/list.json", BASE), 500));
        let err = CompilerRegistry::bootstrap_with(
            config(),
            fetcher,
            Arc::new(ScriptedSandboxFactory::new()),
        )
        .unwrap_err();
        assert_eq!(err.code(), "X001");
    }
}
