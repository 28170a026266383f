//! V8-backed sandbox.
//!
//! Each sandbox owns one isolate and one context. soljson builds are
//! emscripten output with the wasm binary inlined and synchronous
//! instantiation, so loading the module is a single script run.

use std::sync::Once;

use super::{InterruptHandle, Sandbox, SandboxArg, SandboxFactory};
use crate::error::SandboxError;

static PLATFORM_INIT: Once = Once::new();

fn init_platform() {
    PLATFORM_INIT.call_once(|| {
        let platform = v8::new_default_platform(0, false).make_shared();
        v8::V8::initialize_platform(platform);
        v8::V8::initialize();
    });
}

/// Creates V8 sandboxes.
#[derive(Debug, Clone, Default)]
pub struct V8SandboxFactory {
    heap_limit_mb: Option<usize>,
}

impl V8SandboxFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the V8 heap of every isolate this factory creates.
    pub fn with_heap_limit_mb(mut self, heap_limit_mb: usize) -> Self {
        self.heap_limit_mb = Some(heap_limit_mb);
        self
    }
}

impl SandboxFactory for V8SandboxFactory {
    fn name(&self) -> &str {
        "v8"
    }

    fn create(&self) -> Result<Box<dyn Sandbox>, SandboxError> {
        init_platform();

        let mut params = v8::CreateParams::default();
        if let Some(mb) = self.heap_limit_mb {
            params = params.heap_limits(0, mb * 1024 * 1024);
        }
        let mut isolate = v8::Isolate::new(params);
        let context = {
            let scope = &mut v8::HandleScope::new(&mut isolate);
            let context = v8::Context::new(scope);
            v8::Global::new(scope, context)
        };

        Ok(Box::new(V8Sandbox {
            entry: None,
            context,
            isolate,
        }))
    }
}

struct V8Sandbox {
    // Globals are released before the isolate that owns them (field order).
    entry: Option<v8::Global<v8::Function>>,
    context: v8::Global<v8::Context>,
    isolate: v8::OwnedIsolate,
}

impl Sandbox for V8Sandbox {
    fn load(&mut self, name: &str, source: &str) -> Result<(), SandboxError> {
        let scope = &mut v8::HandleScope::new(&mut self.isolate);
        let context = v8::Local::new(scope, &self.context);
        let scope = &mut v8::ContextScope::new(scope, context);
        let tc = &mut v8::TryCatch::new(scope);

        let script_error = |message: String| SandboxError::Script {
            name: name.to_string(),
            message,
        };
        let code = v8::String::new(tc, source)
            .ok_or_else(|| script_error("source too large".to_string()))?;
        let Some(script) = v8::Script::compile(tc, code, None) else {
            return Err(caught(tc, script_error));
        };
        if script.run(tc).is_none() {
            return Err(caught(tc, script_error));
        }
        Ok(())
    }

    fn bind(&mut self, expression: &str) -> Result<(), SandboxError> {
        let scope = &mut v8::HandleScope::new(&mut self.isolate);
        let context = v8::Local::new(scope, &self.context);
        let scope = &mut v8::ContextScope::new(scope, context);
        let tc = &mut v8::TryCatch::new(scope);

        let code = v8::String::new(tc, expression)
            .ok_or_else(|| SandboxError::Binding("expression too large".to_string()))?;
        let Some(script) = v8::Script::compile(tc, code, None) else {
            return Err(caught(tc, SandboxError::Binding));
        };
        let Some(value) = script.run(tc) else {
            return Err(caught(tc, SandboxError::Binding));
        };
        let function = v8::Local::<v8::Function>::try_from(value).map_err(|_| {
            SandboxError::Binding(format!("'{}' did not evaluate to a function", expression))
        })?;
        self.entry = Some(v8::Global::new(tc, function));
        Ok(())
    }

    fn invoke(&mut self, args: &[SandboxArg]) -> Result<String, SandboxError> {
        let entry = self
            .entry
            .as_ref()
            .ok_or_else(|| SandboxError::Binding("no entry point bound".to_string()))?;

        let scope = &mut v8::HandleScope::new(&mut self.isolate);
        let context = v8::Local::new(scope, &self.context);
        let scope = &mut v8::ContextScope::new(scope, context);
        let tc = &mut v8::TryCatch::new(scope);

        let function = v8::Local::new(tc, entry);
        let mut argv: Vec<v8::Local<v8::Value>> = Vec::with_capacity(args.len());
        for arg in args {
            let value: v8::Local<v8::Value> = match arg {
                SandboxArg::Text(text) => v8::String::new(tc, text)
                    .ok_or_else(|| SandboxError::Call("argument string too large".to_string()))?
                    .into(),
                SandboxArg::Number(n) => v8::Integer::new(tc, *n).into(),
                SandboxArg::Null => v8::null(tc).into(),
            };
            argv.push(value);
        }

        let recv: v8::Local<v8::Value> = v8::undefined(tc).into();
        match function.call(tc, recv, &argv) {
            Some(result) if result.is_string() => Ok(result.to_rust_string_lossy(tc)),
            Some(result) => {
                let type_name = result.type_of(tc).to_rust_string_lossy(tc);
                Err(SandboxError::Call(format!(
                    "entry point returned {} instead of a string",
                    type_name
                )))
            }
            None => Err(caught(tc, SandboxError::Call)),
        }
    }

    fn interrupt_handle(&self) -> Option<Box<dyn InterruptHandle>> {
        Some(Box::new(V8Interrupt(self.isolate.thread_safe_handle())))
    }
}

struct V8Interrupt(v8::IsolateHandle);

impl InterruptHandle for V8Interrupt {
    fn interrupt(&self) {
        self.0.terminate_execution();
    }

    fn cancel(&self) {
        self.0.cancel_terminate_execution();
    }
}

/// Converts the pending exception (or termination) into an error and leaves
/// the isolate usable for the next call.
fn caught(
    tc: &mut v8::TryCatch<v8::HandleScope>,
    wrap: impl FnOnce(String) -> SandboxError,
) -> SandboxError {
    if tc.has_terminated() {
        tc.cancel_terminate_execution();
        return SandboxError::Terminated;
    }
    let message = match tc.exception() {
        Some(exception) => exception.to_rust_string_lossy(tc),
        None => "unknown exception".to_string(),
    };
    wrap(message)
}
