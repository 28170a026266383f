//! Standard-JSON compiler input and output documents.
//!
//! Only the fields solcbox reads are typed. Everything else round-trips
//! through the flattened `extra` maps so newer compiler fields are never lost.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Standard-JSON compiler input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerInput {
    pub language: String,
    pub sources: BTreeMap<String, SourceFile>,
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    pub settings: Settings,
}

impl CompilerInput {
    /// Creates a Solidity input with no sources and default settings.
    pub fn solidity() -> Self {
        Self {
            language: "Solidity".to_string(),
            sources: BTreeMap::new(),
            settings: Settings::default(),
        }
    }

    /// Adds a source unit.
    pub fn source(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.insert(name.into(), SourceFile::new(content));
        self
    }

    /// Requests `outputs` for every contract in every file.
    pub fn select_all(mut self, outputs: &[&str]) -> Self {
        let mut contracts = BTreeMap::new();
        contracts.insert(
            "*".to_string(),
            outputs.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        );
        self.settings
            .output_selection
            .insert("*".to_string(), contracts);
        self
    }

    /// Enables the optimizer with the given run count.
    pub fn optimize(mut self, runs: u32) -> Self {
        self.settings.optimizer = Some(Optimizer {
            enabled: true,
            runs: Some(runs),
            extra: Map::new(),
        });
        self
    }
}

/// A single source unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceFile {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            urls: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Compilation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<Optimizer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
    /// file -> contract -> requested outputs
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_selection: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    pub fn is_empty(&self) -> bool {
        self.optimizer.is_none()
            && self.evm_version.is_none()
            && self.output_selection.is_empty()
            && self.extra.is_empty()
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Optimizer {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Standard-JSON compiler output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, Value>,
    /// file -> contract name -> contract output
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contracts: BTreeMap<String, BTreeMap<String, ContractOutput>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompilerOutput {
    /// Returns true if any diagnostic has `error` severity.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(Diagnostic::is_error)
    }

    /// Diagnostics with `error` severity.
    pub fn error_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().filter(|d| d.is_error())
    }

    pub fn contract(&self, file: &str, name: &str) -> Option<&ContractOutput> {
        self.contracts.get(file).and_then(|c| c.get(name))
    }

    /// Creation bytecode of a contract as a hex string without `0x`.
    pub fn bytecode(&self, file: &str, name: &str) -> Option<&str> {
        self.contract(file, name).and_then(ContractOutput::bytecode)
    }

    /// Iterates `(file, contract, output)` over every compiled contract.
    pub fn iter_contracts(&self) -> impl Iterator<Item = (&str, &str, &ContractOutput)> {
        self.contracts.iter().flat_map(|(file, contracts)| {
            contracts
                .iter()
                .map(move |(name, output)| (file.as_str(), name.as_str(), output))
        })
    }
}

/// A compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(default)]
    pub severity: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}

/// Output for a single contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm: Option<EvmOutput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContractOutput {
    pub fn bytecode(&self) -> Option<&str> {
        self.evm
            .as_ref()
            .and_then(|evm| evm.bytecode.as_ref())
            .map(|b| b.object.as_str())
    }

    pub fn deployed_bytecode(&self) -> Option<&str> {
        self.evm
            .as_ref()
            .and_then(|evm| evm.deployed_bytecode.as_ref())
            .map(|b| b.object.as_str())
    }
}

/// EVM-specific contract output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<Bytecode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_bytecode: Option<Bytecode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bytecode object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bytecode {
    #[serde(default)]
    pub object: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_input_builder_serializes_standard_shape() {
        let input = CompilerInput::solidity()
            .source("A.sol", "contract A {}")
            .select_all(&["evm.bytecode.object"])
            .optimize(200);
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            json!({
                "language": "Solidity",
                "sources": {"A.sol": {"content": "contract A {}"}},
                "settings": {
                    "optimizer": {"enabled": true, "runs": 200},
                    "outputSelection": {"*": {"*": ["evm.bytecode.object"]}}
                }
            })
        );
    }

    #[test]
    fn test_input_preserves_unknown_settings() {
        let raw = json!({
            "language": "Solidity",
            "sources": {"A.sol": {"content": "contract A {}"}},
            "settings": {"viaIR": true, "remappings": []}
        });
        let input: CompilerInput = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(input.settings.extra.get("viaIR"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&input).unwrap(), raw);
    }

    #[test]
    fn test_output_accessors() {
        let output: CompilerOutput = serde_json::from_value(json!({
            "errors": [
                {"severity": "warning", "type": "Warning", "message": "unused"},
            ],
            "contracts": {
                "A.sol": {"A": {"evm": {"bytecode": {"object": "6080"}}}}
            },
            "sources": {"A.sol": {"id": 0}}
        }))
        .unwrap();
        assert!(!output.has_errors());
        assert_eq!(output.bytecode("A.sol", "A"), Some("6080"));
        assert_eq!(output.bytecode("A.sol", "B"), None);
        assert_eq!(output.iter_contracts().count(), 1);
    }

    #[test]
    fn test_output_errors() {
        let output: CompilerOutput = serde_json::from_value(json!({
            "errors": [
                {"severity": "error", "type": "ParserError", "message": "Expected ';'"}
            ]
        }))
        .unwrap();
        assert!(output.has_errors());
        assert_eq!(output.error_diagnostics().count(), 1);
        assert!(output.contracts.is_empty());
    }
}
