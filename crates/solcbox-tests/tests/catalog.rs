//! Release catalog loading and lookup.

use pretty_assertions::assert_eq;
use solcbox_core::testing::StaticFetcher;
use solcbox_core::{FetchError, ReleaseCatalog, SolcError};
use solcbox_tests::fixtures::{self, BUILDS, CATALOG_URL};

fn load() -> ReleaseCatalog {
    ReleaseCatalog::fetch(&fixtures::fetcher(), CATALOG_URL).unwrap()
}

#[test]
fn release_list_is_stable_across_calls() {
    let catalog = load();
    let first = catalog.release_version_list().clone();
    for _ in 0..3 {
        assert_eq!(catalog.release_version_list(), &first);
    }
    assert_eq!(first.len(), BUILDS.len());
    assert_eq!(catalog.latest_release(), Some("0.8.17"));
}

#[test]
fn builds_include_nightlies_in_list_order() {
    let catalog = load();
    let versions: Vec<&str> = catalog.builds().iter().map(|b| b.version.as_str()).collect();
    assert_eq!(versions, vec!["0.4.9", "0.5.3", "0.6.0", "0.8.17", "0.8.18"]);
    assert_eq!(catalog.builds().len(), catalog.release_version_list().len() + 1);
}

#[test]
fn every_release_resolves_to_its_binary() {
    let catalog = load();
    for (version, long_version, path) in BUILDS {
        assert_eq!(catalog.resolve_binary_path(version), Some(*path));
        assert_eq!(catalog.resolve_binary_path(long_version), Some(*path));
    }
}

#[test]
fn nightly_is_only_reachable_by_long_version() {
    let catalog = load();
    let nightly = "0.8.18-nightly.2022.11.23+commit.eb2f874e";
    let build = catalog.build(nightly).unwrap();
    assert_eq!(build.prerelease.as_deref(), Some("nightly.2022.11.23"));
    assert!(!catalog.release_version_list().contains_key("0.8.18"));
}

#[test]
fn unreachable_catalog_is_a_fetch_error() {
    let fetcher = StaticFetcher::new().with_status(CATALOG_URL, 503);
    let err = ReleaseCatalog::fetch(&fetcher, CATALOG_URL).unwrap_err();
    match &err {
        SolcError::CatalogFetch { source } => {
            assert_eq!(
                source,
                &FetchError::Status {
                    url: CATALOG_URL.to_string(),
                    status: 503
                }
            );
        }
        other => panic!("expected CatalogFetch, got {:?}", other),
    }
}

#[test]
fn html_error_page_is_a_parse_error() {
    let fetcher = StaticFetcher::new().with_body(CATALOG_URL, "<html>rate limited</html>");
    let err = ReleaseCatalog::fetch(&fetcher, CATALOG_URL).unwrap_err();
    assert_eq!(err.code(), "X002");
}
