//! JSON output types for machine-readable CLI output.
//!
//! Every `--json` command prints one document with a `success` flag and a
//! list of [`JsonError`]s. Library failures keep their X-series code; errors
//! raised by the CLI itself use the `CLI_` codes below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solcbox_core::SolcError;

/// Error codes for CLI operations.
///
/// Format: CLI_XXX for CLI-level errors; library errors pass through their
/// own codes.
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// Argument is not a hex string
    pub const INVALID_HEX: &str = "CLI_002";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "X003")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category for library errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Suggestion for fixing the error (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: None,
            file: None,
            suggestion: None,
        }
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Sets a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl From<&SolcError> for JsonError {
    fn from(err: &SolcError) -> Self {
        let mut json = JsonError::new(err.code(), err.to_string());
        json.category = Some(err.category().to_string());
        if let SolcError::VersionNotFound { .. } = err {
            json = json.with_suggestion("run `solcbox releases` to list published versions");
        }
        json
    }
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize JSON output")?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_error_skips_empty_fields() {
        let json = serde_json::to_value(JsonError::new(error_codes::FILE_READ, "nope")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "CLI_001", "message": "nope"}));
    }

    #[test]
    fn test_from_solc_error() {
        let err = SolcError::VersionNotFound {
            version: "0.9.99".to_string(),
        };
        let json = JsonError::from(&err);
        assert_eq!(json.code, "X003");
        assert_eq!(json.category.as_deref(), Some("catalog"));
        assert!(json.suggestion.is_some());
    }
}
