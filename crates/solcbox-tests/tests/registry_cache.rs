//! Registry caching and single-flight loading.

use pretty_assertions::assert_eq;
use solcbox_core::testing::{ScriptedSandboxFactory, StaticFetcher};
use solcbox_core::CompilerInput;
use solcbox_tests::{fixtures, RegistryHarness};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn same_version_returns_same_instance_with_one_fetch() {
    let h = RegistryHarness::new();
    let first = h.registry.get_compiler("0.8.17").unwrap();
    let second = h.registry.get_compiler("0.8.17").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(h.binary_fetches("0.8.17"), 1);
    assert_eq!(h.factory.created(), 1);
}

#[test]
fn distinct_versions_get_distinct_instances() {
    let h = RegistryHarness::new();
    let old = h.registry.get_compiler("0.5.3").unwrap();
    let new = h.registry.get_compiler("0.8.17").unwrap();
    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(old.version().as_str(), "0.5.3");
    assert_eq!(new.version().as_str(), "0.8.17");

    let a = old
        .compile(&CompilerInput::solidity().source("A.sol", "contract A {}"))
        .unwrap();
    let b = new
        .compile(&CompilerInput::solidity().source("B.sol", "contract B {}"))
        .unwrap();
    assert!(a.bytecode("A.sol", "A").is_some());
    assert!(a.contract("B.sol", "B").is_none());
    assert!(b.bytecode("B.sol", "B").is_some());
    assert!(b.contract("A.sol", "A").is_none());

    assert_eq!(
        h.registry.cached_versions(),
        vec!["0.5.3".to_string(), "0.8.17".to_string()]
    );
}

#[test]
fn concurrent_first_requests_share_one_load() {
    let h = RegistryHarness::with(
        fixtures::fetcher().with_delay(Duration::from_millis(100)),
        ScriptedSandboxFactory::new(),
    );
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let registry = h.registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.get_compiler("0.8.17").unwrap()
            })
        })
        .collect();
    let compilers: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

    for compiler in &compilers[1..] {
        assert!(Arc::ptr_eq(&compilers[0], compiler));
    }
    assert_eq!(h.binary_fetches("0.8.17"), 1);
    assert_eq!(h.factory.created(), 1);
}

#[test]
fn concurrent_requests_for_different_versions_all_load() {
    let h = RegistryHarness::with(
        fixtures::fetcher().with_delay(Duration::from_millis(50)),
        ScriptedSandboxFactory::new(),
    );
    let versions = ["0.4.9", "0.5.3", "0.6.0", "0.8.17"];
    let barrier = Arc::new(Barrier::new(versions.len()));

    let handles: Vec<_> = versions
        .iter()
        .map(|version| {
            let registry = h.registry.clone();
            let barrier = barrier.clone();
            let version = version.to_string();
            thread::spawn(move || {
                barrier.wait();
                registry.get_compiler(&version).unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(h.registry.len(), versions.len());
    for version in versions {
        assert_eq!(h.binary_fetches(version), 1);
    }
}

#[test]
fn unknown_version_is_not_found_without_network() {
    let h = RegistryHarness::new();
    let catalog_hits = h.fetcher.total_hits();

    let err = h.registry.get_compiler("0.9.99").unwrap_err();
    assert_eq!(err.code(), "X003");
    assert_eq!(h.fetcher.total_hits(), catalog_hits);
    assert!(h.registry.is_empty());
}

#[test]
fn failed_load_is_retried_on_next_request() {
    let fetcher = StaticFetcher::new()
        .with_body(fixtures::CATALOG_URL, fixtures::catalog_json())
        .with_status(fixtures::binary_url("0.8.17"), 502);
    let h = RegistryHarness::with(fetcher, ScriptedSandboxFactory::new());

    for _ in 0..3 {
        let err = h.registry.get_compiler("0.8.17").unwrap_err();
        assert_eq!(err.code(), "X004");
    }
    assert_eq!(h.binary_fetches("0.8.17"), 3);
    assert!(h.registry.is_empty());
}

#[test]
fn construction_failure_caches_nothing() {
    let h = RegistryHarness::with_factory(ScriptedSandboxFactory::new().without_entry_point());

    let err = h.registry.get_compiler("0.6.0").unwrap_err();
    assert_eq!(err.code(), "X007");
    let err = h.registry.get_compiler("0.6.0").unwrap_err();
    assert_eq!(err.code(), "X007");

    assert_eq!(h.binary_fetches("0.6.0"), 2);
    assert_eq!(h.factory.dropped(), 2);
    assert!(h.registry.is_empty());
}

#[test]
fn long_version_resolves_to_same_build() {
    let h = RegistryHarness::new();
    let compiler = h.registry.get_compiler("0.8.17+commit.8df45f5f").unwrap();
    assert_eq!(compiler.version().short(), "0.8.17");
    assert_eq!(h.binary_fetches("0.8.17"), 1);
}
