//! Entry point selection per compiler release line.

use pretty_assertions::assert_eq;
use solcbox_core::{CallConvention, CompilerInput, CompilerVersion, SandboxArg};
use solcbox_tests::RegistryHarness;

struct Case {
    version: &'static str,
    convention: CallConvention,
    bind: &'static str,
    arity: usize,
}

const CASES: &[Case] = &[
    Case {
        version: "0.4.9",
        convention: CallConvention::Legacy,
        bind: "Module.cwrap('compileStandard', 'string', ['string', 'number'])",
        arity: 2,
    },
    Case {
        version: "0.5.3",
        convention: CallConvention::Standard,
        bind: "Module.cwrap('solidity_compile', 'string', ['string', 'number', 'number'])",
        arity: 2,
    },
    Case {
        version: "0.6.0",
        convention: CallConvention::StandardWithCallback,
        bind: "Module.cwrap('solidity_compile', 'string', ['string', 'number', 'number'])",
        arity: 3,
    },
    Case {
        version: "0.8.17",
        convention: CallConvention::StandardWithCallback,
        bind: "Module.cwrap('solidity_compile', 'string', ['string', 'number', 'number'])",
        arity: 3,
    },
];

#[test]
fn each_release_line_binds_its_entry_point() {
    let h = RegistryHarness::new();
    for case in CASES {
        let compiler = h.registry.get_compiler(case.version).unwrap();
        assert_eq!(compiler.convention(), case.convention, "{}", case.version);
    }
    let expected: Vec<String> = CASES.iter().map(|c| c.bind.to_string()).collect();
    assert_eq!(h.factory.bound_expressions(), expected);
}

#[test]
fn each_release_line_is_called_with_its_arity() {
    let h = RegistryHarness::new();
    let input = CompilerInput::solidity().source("A.sol", "contract A {}");
    for case in CASES {
        let compiler = h.registry.get_compiler(case.version).unwrap();
        let output = compiler.compile(&input).unwrap();
        assert!(!output.bytecode("A.sol", "A").unwrap_or_default().is_empty());
    }

    let calls = h.factory.calls();
    assert_eq!(calls.len(), CASES.len());
    for (case, args) in CASES.iter().zip(&calls) {
        assert_eq!(args.len(), case.arity, "{}", case.version);
        assert!(matches!(args[0], SandboxArg::Text(_)));
        assert_eq!(args[1], SandboxArg::Number(0));
        if case.arity == 3 {
            assert_eq!(args[2], SandboxArg::Null);
        }
    }
}

#[test]
fn prerelease_of_a_line_uses_the_previous_convention() {
    let nightly = CompilerVersion::parse("0.6.0-nightly.2019.12.17+commit.d13438ee").unwrap();
    assert_eq!(CallConvention::for_version(&nightly), CallConvention::Standard);
}

#[test]
fn nightly_build_is_resolved_by_long_version() {
    let h = RegistryHarness::new();
    let err = h
        .registry
        .get_compiler("0.8.18-nightly.2022.11.23+commit.eb2f874e")
        .unwrap_err();
    // resolved in the catalog, but the fixture fetcher has no binary for it
    assert_eq!(err.code(), "X004");
}
