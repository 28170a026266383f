//! solcbox core library
//!
//! Hosts many Solidity compiler releases side by side in one process. Each
//! release is a soljson script (an Emscripten build of solc) loaded into its
//! own sandboxed script engine and driven through the standard-JSON interface.
//!
//! # Overview
//!
//! - **Catalog**: the remote `list.json` snapshot, fetched once at startup
//! - **Registry**: version-keyed cache that downloads and loads a release on
//!   first use and hands out the same instance afterwards
//! - **Compiler**: one loaded release, with serialized calls, an optional
//!   call timeout and a terminal `close`
//! - **Verify**: bytecode comparison that ignores the metadata hash
//!
//! # Example
//!
//! ```
//! use solcbox_core::verify_bytecode;
//!
//! let recorded = "6080604052a2646970667358221220aaaa64736f6c634300081100";
//! let rebuilt = "6080604052a2646970667358221220bbbb64736f6c634300081100";
//! assert!(verify_bytecode(rebuilt, recorded, "ipfs").unwrap());
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: Release catalog parsing and lookup
//! - [`compiler`]: Sandboxed compiler instances
//! - [`config`]: Layered configuration
//! - [`error`]: Error types with stable codes
//! - [`fetch`]: HTTP transport
//! - [`registry`]: Compiler cache
//! - [`sandbox`]: Script engine abstraction and calling conventions
//! - [`standard_json`]: Standard-JSON input and output types
//! - [`verify`]: Bytecode verification
//! - [`version`]: Version parsing

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod sandbox;
pub mod standard_json;
pub mod verify;
pub mod version;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types at the crate root
pub use catalog::{BuildInfo, ReleaseCatalog};
pub use compiler::{SandboxOptions, SandboxedCompiler};
pub use config::SolcConfig;
pub use error::{FetchError, SandboxError, SolcError};
pub use fetch::{BinaryFetcher, HttpFetcher};
pub use registry::CompilerRegistry;
pub use sandbox::{CallConvention, Sandbox, SandboxArg, SandboxFactory};
#[cfg(feature = "v8")]
pub use sandbox::V8SandboxFactory;
pub use standard_json::{CompilerInput, CompilerOutput, ContractOutput, Diagnostic};
pub use verify::{strip_metadata, verify_bytecode, MetadataPattern, DEFAULT_METADATA_HASH};
pub use version::CompilerVersion;
