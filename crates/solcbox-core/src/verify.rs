//! Bytecode equivalence modulo the trailing metadata blob.
//!
//! solc appends a CBOR map to every contract's bytecode, keyed by the hash
//! scheme (`ipfs`, `bzzr0`, `bzzr1`) and ending with the `solc` version entry.
//! Two builds of the same source differ only inside that map when the
//! metadata hash changes, so the hash segment is cut out before comparing.
//!
//! See <https://docs.soliditylang.org/en/v0.8.17/metadata.html>.

use regex::Regex;
use std::borrow::Cow;

use crate::error::SolcError;

/// Key of the compiler-version entry that closes the metadata map.
const SOLC_KEY: &str = "solc";

/// Hash scheme key used by current solc releases.
pub const DEFAULT_METADATA_HASH: &str = "ipfs";

/// Compiled matcher for one metadata hash scheme.
#[derive(Debug, Clone)]
pub struct MetadataPattern {
    hash: String,
    start: String,
    end: String,
    regex: Regex,
}

impl MetadataPattern {
    /// Builds the matcher for the given hash scheme key (e.g. `ipfs`).
    pub fn new(metadata_hash: &str) -> Result<Self, SolcError> {
        let start = cbor_hex(metadata_hash)?;
        let end = cbor_hex(SOLC_KEY)?;
        let regex = Regex::new(&format!(r"(?-u)\w+?({}\w+){}\w+?", start, end)).map_err(
            |e| SolcError::MetadataEncoding {
                marker: metadata_hash.to_string(),
                message: e.to_string(),
            },
        )?;
        Ok(Self {
            hash: metadata_hash.to_string(),
            start,
            end,
            regex,
        })
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Hex of the CBOR-encoded hash key.
    pub fn start_marker(&self) -> &str {
        &self.start
    }

    /// Hex of the CBOR-encoded `solc` key.
    pub fn end_marker(&self) -> &str {
        &self.end
    }

    /// Removes every occurrence of the first matched metadata segment.
    ///
    /// Input without a match comes back unchanged, so the comparison falls
    /// back to raw equality.
    pub fn strip<'a>(&self, bytecode: &'a str) -> Cow<'a, str> {
        match self.regex.captures(bytecode).and_then(|c| c.get(1)) {
            Some(segment) => Cow::Owned(bytecode.replace(segment.as_str(), "")),
            None => Cow::Borrowed(bytecode),
        }
    }

    /// True iff both strings are identical after stripping.
    pub fn equivalent(&self, compiled: &str, reference: &str) -> bool {
        self.strip(compiled) == self.strip(reference)
    }
}

fn cbor_hex(text: &str) -> Result<String, SolcError> {
    let mut buf = Vec::new();
    ciborium::into_writer(text, &mut buf).map_err(|e| SolcError::MetadataEncoding {
        marker: text.to_string(),
        message: e.to_string(),
    })?;
    Ok(hex::encode(buf))
}

/// Strips the metadata segment for `metadata_hash` from `bytecode`.
pub fn strip_metadata(bytecode: &str, metadata_hash: &str) -> Result<String, SolcError> {
    Ok(MetadataPattern::new(metadata_hash)?
        .strip(bytecode)
        .into_owned())
}

/// Compares two hex bytecode strings, ignoring the metadata hash segment.
///
/// # Arguments
/// * `compiled` - Freshly compiled bytecode
/// * `reference` - Previously recorded bytecode
/// * `metadata_hash` - Hash scheme key of the metadata map (e.g. `ipfs`)
pub fn verify_bytecode(
    compiled: &str,
    reference: &str,
    metadata_hash: &str,
) -> Result<bool, SolcError> {
    let pattern = MetadataPattern::new(metadata_hash)?;
    let matched = pattern.equivalent(compiled, reference);
    tracing::debug!(metadata_hash, matched, "bytecode compared");
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_metadata(code: &str, hash: &str) -> String {
        format!(
            "{}a2{}5822{}{}43000811{}",
            code, "6469706673", hash, "64736f6c63", "0033"
        )
    }

    #[test]
    fn test_markers() {
        let pattern = MetadataPattern::new("ipfs").unwrap();
        assert_eq!(pattern.start_marker(), "6469706673");
        assert_eq!(pattern.end_marker(), "64736f6c63");
        assert_eq!(MetadataPattern::new("bzzr1").unwrap().start_marker(), "65627a7a7231");
    }

    #[test]
    fn test_metadata_only_difference_matches() {
        let a = with_metadata("6080604052", &format!("1220{}", "aa".repeat(32)));
        let b = with_metadata("6080604052", &format!("1220{}", "bb".repeat(32)));
        assert_ne!(a, b);
        assert!(verify_bytecode(&a, &b, "ipfs").unwrap());
    }

    #[test]
    fn test_code_difference_does_not_match() {
        let hash = format!("1220{}", "aa".repeat(32));
        let a = with_metadata("6080604052", &hash);
        let b = with_metadata("6080604053", &hash);
        assert!(!verify_bytecode(&a, &b, "ipfs").unwrap());
    }

    #[test]
    fn test_strip_removes_hash_segment() {
        let code = with_metadata("6080604052", &format!("1220{}", "cd".repeat(32)));
        assert_eq!(
            strip_metadata(&code, "ipfs").unwrap(),
            "6080604052a264736f6c63430008110033"
        );
    }

    #[test]
    fn test_no_metadata_falls_back_to_raw() {
        let pattern = MetadataPattern::new("ipfs").unwrap();
        assert!(matches!(pattern.strip("60806040"), Cow::Borrowed(_)));
        assert!(pattern.equivalent("60806040", "60806040"));
        assert!(!pattern.equivalent("60806040", "60806041"));
    }

    #[test]
    fn test_wrong_hash_key_falls_back_to_raw() {
        let a = with_metadata("6080604052", &format!("1220{}", "aa".repeat(32)));
        let b = with_metadata("6080604052", &format!("1220{}", "bb".repeat(32)));
        assert!(!verify_bytecode(&a, &b, "bzzr0").unwrap());
    }
}
