//! Script execution environments hosting soljson builds.
//!
//! A [`Sandbox`] is one isolated engine instance: it loads a compiler module,
//! binds an entry point and calls it. Engines such as V8 pin their state to
//! the thread that created them, so sandboxes are not required to be `Send`;
//! a [`SandboxFactory`] is shared across threads instead and is asked to build
//! each sandbox on the thread that will own it.
//!
//! # Engines
//!
//! - **V8** (`v8` feature): [`V8SandboxFactory`], used in production.
//! - **Scripted** (`testing` feature): in-process double used by tests.

mod convention;
#[cfg(feature = "v8")]
mod v8_engine;

pub use convention::CallConvention;
#[cfg(feature = "v8")]
pub use v8_engine::V8SandboxFactory;

use crate::error::SandboxError;

/// A value passed to the bound entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxArg {
    Text(String),
    Number(i32),
    Null,
}

/// One isolated execution environment.
///
/// Dropping the sandbox releases every engine resource it holds.
pub trait Sandbox {
    /// Runs a script in the global scope, discarding its value.
    fn load(&mut self, name: &str, source: &str) -> Result<(), SandboxError>;

    /// Evaluates `expression` and keeps the resulting function as the entry point.
    fn bind(&mut self, expression: &str) -> Result<(), SandboxError>;

    /// Calls the bound entry point and returns its string result.
    fn invoke(&mut self, args: &[SandboxArg]) -> Result<String, SandboxError>;

    /// Handle that can stop a running [`Sandbox::invoke`] from another thread.
    fn interrupt_handle(&self) -> Option<Box<dyn InterruptHandle>> {
        None
    }
}

/// Stops in-flight execution in a sandbox owned by another thread.
pub trait InterruptHandle: Send + Sync {
    fn interrupt(&self);

    /// Drops an interrupt that arrived after the call it targeted had
    /// already returned, so it cannot fire on the next call.
    fn cancel(&self);
}

/// Builds sandboxes. Shared across threads; each sandbox is created on the
/// thread that owns it for its whole lifetime.
pub trait SandboxFactory: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &str;

    fn create(&self) -> Result<Box<dyn Sandbox>, SandboxError>;
}
