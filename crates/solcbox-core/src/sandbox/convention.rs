//! Entry point calling conventions across solc release lines.

use std::fmt;

use super::SandboxArg;
use crate::version::{CompilerVersion, IMPORT_CALLBACK_SINCE, SOLIDITY_COMPILE_SINCE};

/// How a soljson build exposes its standard-JSON entry point.
///
/// Chosen once from the compiler version when a sandbox is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallConvention {
    /// `< 0.5.0`: `compileStandard(input, optimize)`.
    Legacy,
    /// `0.5.x`: `solidity_compile` wrapped with three parameters, called with two.
    Standard,
    /// `>= 0.6.0`: `solidity_compile(input, optimize, callback)` with a null callback.
    StandardWithCallback,
}

impl CallConvention {
    /// Selects the convention for a compiler version.
    pub fn for_version(version: &CompilerVersion) -> Self {
        let v = version.semver();
        if *v < SOLIDITY_COMPILE_SINCE {
            CallConvention::Legacy
        } else if *v < IMPORT_CALLBACK_SINCE {
            CallConvention::Standard
        } else {
            CallConvention::StandardWithCallback
        }
    }

    /// Exported C symbol name.
    pub fn entry_point(&self) -> &'static str {
        match self {
            CallConvention::Legacy => "compileStandard",
            CallConvention::Standard | CallConvention::StandardWithCallback => {
                "solidity_compile"
            }
        }
    }

    /// Parameter types handed to `Module.cwrap`.
    pub fn param_types(&self) -> &'static [&'static str] {
        match self {
            CallConvention::Legacy => &["string", "number"],
            CallConvention::Standard | CallConvention::StandardWithCallback => {
                &["string", "number", "number"]
            }
        }
    }

    /// Number of arguments actually passed per call.
    pub fn call_arity(&self) -> usize {
        match self {
            CallConvention::Legacy | CallConvention::Standard => 2,
            CallConvention::StandardWithCallback => 3,
        }
    }

    /// Script that evaluates to the bound entry point function.
    pub fn bind_expression(&self) -> String {
        let params = self
            .param_types()
            .iter()
            .map(|p| format!("'{}'", p))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Module.cwrap('{}', 'string', [{}])",
            self.entry_point(),
            params
        )
    }

    /// Arguments for one call with the given serialized input.
    ///
    /// Optimization is configured through the input's `settings`, so the
    /// optimize flag is always zero.
    pub fn call_args(&self, input: &str) -> Vec<SandboxArg> {
        let mut args = vec![SandboxArg::Text(input.to_string()), SandboxArg::Number(0)];
        if *self == CallConvention::StandardWithCallback {
            args.push(SandboxArg::Null);
        }
        debug_assert_eq!(args.len(), self.call_arity());
        args
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallConvention::Legacy => "legacy",
            CallConvention::Standard => "standard",
            CallConvention::StandardWithCallback => "standard-with-callback",
        }
    }
}

impl fmt::Display for CallConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn convention(v: &str) -> CallConvention {
        CallConvention::for_version(&CompilerVersion::parse(v).unwrap())
    }

    #[test]
    fn test_dispatch_boundaries() {
        assert_eq!(convention("0.4.9"), CallConvention::Legacy);
        assert_eq!(convention("0.4.26"), CallConvention::Legacy);
        assert_eq!(convention("0.5.0"), CallConvention::Standard);
        assert_eq!(convention("0.5.3"), CallConvention::Standard);
        assert_eq!(convention("0.5.17"), CallConvention::Standard);
        assert_eq!(convention("0.6.0"), CallConvention::StandardWithCallback);
        assert_eq!(convention("0.8.17"), CallConvention::StandardWithCallback);
    }

    #[test]
    fn test_legacy_binding() {
        let c = convention("0.4.9");
        assert_eq!(c.entry_point(), "compileStandard");
        assert_eq!(c.param_types(), &["string", "number"]);
        assert_eq!(
            c.bind_expression(),
            "Module.cwrap('compileStandard', 'string', ['string', 'number'])"
        );
        assert_eq!(c.call_args("{}").len(), 2);
    }

    #[test]
    fn test_standard_binding_wraps_three_calls_two() {
        let c = convention("0.5.3");
        assert_eq!(c.entry_point(), "solidity_compile");
        assert_eq!(c.param_types().len(), 3);
        assert_eq!(c.call_arity(), 2);
        assert_eq!(
            c.call_args("{}"),
            vec![SandboxArg::Text("{}".to_string()), SandboxArg::Number(0)]
        );
    }

    #[test]
    fn test_callback_binding_passes_null_callback() {
        for v in ["0.6.0", "0.8.17"] {
            let c = convention(v);
            assert_eq!(
                c.bind_expression(),
                "Module.cwrap('solidity_compile', 'string', ['string', 'number', 'number'])"
            );
            assert_eq!(
                c.call_args("{}"),
                vec![
                    SandboxArg::Text("{}".to_string()),
                    SandboxArg::Number(0),
                    SandboxArg::Null
                ]
            );
        }
    }
}
