//! Scripted test doubles for the fetcher and sandbox seams.
//!
//! Enabled for this crate's unit tests and, through the `testing` feature,
//! for downstream integration tests.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{FetchError, SandboxError};
use crate::fetch::BinaryFetcher;
use crate::sandbox::{InterruptHandle, Sandbox, SandboxArg, SandboxFactory};

/// Module source accepted by [`ScriptedSandboxFactory`].
pub const FAKE_MODULE: &str = "var Module = { cwrap: function () { return function () {}; } };";

/// Builds a `list.json` document from `(version, path)` pairs.
pub fn catalog_json(builds: &[(&str, &str)]) -> String {
    let builds: Vec<Value> = builds
        .iter()
        .map(|(version, path)| json!({"path": path, "version": version}))
        .collect();
    let releases: Map<String, Value> = builds
        .iter()
        .map(|b| (b["version"].as_str().unwrap_or_default().to_string(), b["path"].clone()))
        .collect();
    json!({"builds": builds, "releases": releases}).to_string()
}

/// Fetcher serving canned responses and counting requests per URL.
///
/// Unknown URLs answer with status 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Result<Vec<u8>, u16>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.responses.insert(url.into(), Err(status));
        self
    }

    /// Sleeps this long inside every fetch, widening race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of requests made for `url`.
    pub fn hits(&self, url: &str) -> usize {
        self.hits
            .lock()
            .map(|h| h.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().map(|h| h.values().sum()).unwrap_or(0)
    }
}

impl BinaryFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if let Ok(mut hits) = self.hits.lock() {
            *hits.entry(url.to_string()).or_insert(0) += 1;
        }
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// One recorded entry point call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub sandbox_id: usize,
    pub args: Vec<SandboxArg>,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Debug, Default)]
struct Journal {
    created: AtomicUsize,
    dropped: AtomicUsize,
    interrupts: AtomicUsize,
    invocations: AtomicUsize,
    bound: Mutex<Vec<String>>,
    calls: Mutex<Vec<CallRecord>>,
}

/// Factory for in-process sandboxes that imitate a soljson module.
///
/// Loading fails for sources starting with `throw`. The entry point answers
/// standard-JSON input with one contract per `contract <Name>` declaration,
/// each with a short non-empty bytecode.
///
/// As with V8, an interrupt that is still pending when a call starts
/// terminates that call.
#[derive(Debug, Default)]
pub struct ScriptedSandboxFactory {
    journal: Arc<Journal>,
    missing_entry_point: bool,
    response: Option<String>,
    call_delay: Duration,
    slow_calls: Option<usize>,
    uninterruptible: bool,
}

impl ScriptedSandboxFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding fails as if the module exported no compile symbol.
    pub fn without_entry_point(mut self) -> Self {
        self.missing_entry_point = true;
        self
    }

    /// Every call returns this text verbatim.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Every call takes this long unless interrupted.
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    /// Limits the call delay to the first `count` calls across all sandboxes.
    pub fn with_slow_calls(mut self, count: usize) -> Self {
        self.slow_calls = Some(count);
        self
    }

    /// Running calls ignore interrupts and finish normally. The interrupt
    /// stays pending for the next call.
    pub fn uninterruptible(mut self) -> Self {
        self.uninterruptible = true;
        self
    }

    pub fn created(&self) -> usize {
        self.journal.created.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.journal.dropped.load(Ordering::SeqCst)
    }

    pub fn interrupts(&self) -> usize {
        self.journal.interrupts.load(Ordering::SeqCst)
    }

    /// Entry point expressions bound so far, in order.
    pub fn bound_expressions(&self) -> Vec<String> {
        self.journal
            .bound
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Arguments of every completed call, in completion order.
    pub fn calls(&self) -> Vec<Vec<SandboxArg>> {
        self.call_records().into_iter().map(|c| c.args).collect()
    }

    pub fn call_records(&self) -> Vec<CallRecord> {
        self.journal
            .calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl SandboxFactory for ScriptedSandboxFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    fn create(&self) -> Result<Box<dyn Sandbox>, SandboxError> {
        let id = self.journal.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSandbox {
            id,
            journal: self.journal.clone(),
            missing_entry_point: self.missing_entry_point,
            response: self.response.clone(),
            call_delay: self.call_delay,
            slow_calls: self.slow_calls,
            uninterruptible: self.uninterruptible,
            loaded: false,
            bound: false,
            interrupted: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct ScriptedSandbox {
    id: usize,
    journal: Arc<Journal>,
    missing_entry_point: bool,
    response: Option<String>,
    call_delay: Duration,
    slow_calls: Option<usize>,
    uninterruptible: bool,
    loaded: bool,
    bound: bool,
    interrupted: Arc<AtomicBool>,
}

impl ScriptedSandbox {
    fn wait(&self, call_index: usize) -> Result<(), SandboxError> {
        let delay = match self.slow_calls {
            Some(count) if call_index >= count => Duration::ZERO,
            _ => self.call_delay,
        };
        let deadline = Instant::now() + delay;
        while Instant::now() < deadline {
            if !self.uninterruptible && self.interrupted.swap(false, Ordering::SeqCst) {
                return Err(SandboxError::Terminated);
            }
            thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    }

    fn answer(&self, args: &[SandboxArg]) -> Result<String, SandboxError> {
        if let Some(response) = &self.response {
            return Ok(response.clone());
        }
        let Some(SandboxArg::Text(input)) = args.first() else {
            return Err(SandboxError::Call("first argument must be a string".to_string()));
        };
        let input: Value = serde_json::from_str(input)
            .map_err(|e| SandboxError::Call(format!("invalid input: {}", e)))?;

        let mut contracts = Map::new();
        if let Some(sources) = input.get("sources").and_then(Value::as_object) {
            for (file, source) in sources {
                let content = source
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let mut per_file = Map::new();
                for name in contract_names(content) {
                    let bytecode = format!("6080604052{}", hex::encode(name.as_bytes()));
                    per_file.insert(
                        name,
                        json!({"abi": [], "evm": {"bytecode": {"object": bytecode}}}),
                    );
                }
                contracts.insert(file.clone(), Value::Object(per_file));
            }
        }
        Ok(json!({"contracts": contracts}).to_string())
    }
}

fn contract_names(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut tokens = source.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "contract" {
            if let Some(name) = tokens.next() {
                let name: String = name
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    names.push(name);
                }
            }
        }
    }
    names
}

impl Sandbox for ScriptedSandbox {
    fn load(&mut self, name: &str, source: &str) -> Result<(), SandboxError> {
        if source.trim_start().starts_with("throw") {
            return Err(SandboxError::Script {
                name: name.to_string(),
                message: source.to_string(),
            });
        }
        self.loaded = true;
        Ok(())
    }

    fn bind(&mut self, expression: &str) -> Result<(), SandboxError> {
        if !self.loaded {
            return Err(SandboxError::Binding("Module is not defined".to_string()));
        }
        if self.missing_entry_point {
            return Err(SandboxError::Binding(format!(
                "'{}' did not evaluate to a function",
                expression
            )));
        }
        if let Ok(mut bound) = self.journal.bound.lock() {
            bound.push(expression.to_string());
        }
        self.bound = true;
        Ok(())
    }

    fn invoke(&mut self, args: &[SandboxArg]) -> Result<String, SandboxError> {
        if !self.bound {
            return Err(SandboxError::Binding("no entry point bound".to_string()));
        }
        if self.interrupted.swap(false, Ordering::SeqCst) {
            return Err(SandboxError::Terminated);
        }
        let call_index = self.journal.invocations.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        self.wait(call_index)?;
        let result = self.answer(args);
        if let Ok(mut calls) = self.journal.calls.lock() {
            calls.push(CallRecord {
                sandbox_id: self.id,
                args: args.to_vec(),
                started,
                finished: Instant::now(),
            });
        }
        result
    }

    fn interrupt_handle(&self) -> Option<Box<dyn InterruptHandle>> {
        Some(Box::new(ScriptedInterrupt {
            flag: self.interrupted.clone(),
            journal: self.journal.clone(),
        }))
    }
}

impl Drop for ScriptedSandbox {
    fn drop(&mut self) {
        self.journal.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedInterrupt {
    flag: Arc<AtomicBool>,
    journal: Arc<Journal>,
}

impl InterruptHandle for ScriptedInterrupt {
    fn interrupt(&self) {
        self.journal.interrupts.fetch_add(1, Ordering::SeqCst);
        self.flag.store(true, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_names() {
        assert_eq!(
            contract_names("pragma solidity ^0.8.0; contract A {} contract B_2{}"),
            vec!["A".to_string(), "B_2".to_string()]
        );
        assert!(contract_names("library L {}").is_empty());
    }

    #[test]
    fn test_static_fetcher_counts_hits() {
        let fetcher = StaticFetcher::new().with_body("u", b"x".to_vec());
        assert!(fetcher.fetch("u").is_ok());
        assert!(fetcher.fetch("missing").is_err());
        assert_eq!(fetcher.hits("u"), 1);
        assert_eq!(fetcher.total_hits(), 2);
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = catalog_json(&[("0.8.17", "soljson-v0.8.17.js")]);
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["builds"][0]["path"], "soljson-v0.8.17.js");
        assert_eq!(value["releases"]["0.8.17"], "soljson-v0.8.17.js");
    }
}
