//! A single compiler version hosted in its own sandbox.
//!
//! The sandbox lives on a dedicated worker thread for its whole lifetime,
//! since engines like V8 cannot move between threads. Callers talk to it
//! through [`SandboxedCompiler`], which holds a per-instance lock for the
//! duration of every call, so calls into one instance never overlap while
//! calls into different instances run in parallel.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::SolcConfig;
use crate::error::{SandboxError, SolcError};
use crate::sandbox::{CallConvention, InterruptHandle, Sandbox, SandboxArg, SandboxFactory};
use crate::standard_json::{CompilerInput, CompilerOutput};
use crate::version::CompilerVersion;

/// Script name used when loading the compiler module.
const MODULE_SCRIPT_NAME: &str = "soljson.js";

/// Per-instance hosting options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxOptions {
    /// Deadline for a single compile call.
    pub timeout: Option<Duration>,
}

impl SandboxOptions {
    pub fn from_config(config: &SolcConfig) -> Self {
        Self {
            timeout: config.compile_timeout(),
        }
    }
}

struct Job {
    args: Vec<SandboxArg>,
    reply: mpsc::Sender<Result<String, SandboxError>>,
}

struct Worker {
    jobs: mpsc::Sender<Job>,
    thread: JoinHandle<()>,
    interrupt: Option<Box<dyn InterruptHandle>>,
}

type ReadySignal = Result<Option<Box<dyn InterruptHandle>>, SandboxError>;

impl Worker {
    fn spawn(
        factory: Arc<dyn SandboxFactory>,
        source: String,
        convention: CallConvention,
        version: &CompilerVersion,
    ) -> Result<Self, SolcError> {
        let init_error = |message: String| SolcError::SandboxInit {
            version: version.to_string(),
            message,
        };

        let (jobs, job_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<ReadySignal>(1);

        let thread = thread::Builder::new()
            .name(format!("solc-{}", version))
            .spawn(move || {
                let mut sandbox = match init_sandbox(factory.as_ref(), &source, convention) {
                    Ok(sandbox) => sandbox,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                drop(source);
                let _ = ready_tx.send(Ok(sandbox.interrupt_handle()));

                // Runs until every sender is dropped, then tears the sandbox down.
                for job in job_rx {
                    let result = sandbox.invoke(&job.args);
                    let _ = job.reply.send(result);
                }
            })
            .map_err(|e| init_error(format!("failed to spawn sandbox thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(interrupt)) => Ok(Self {
                jobs,
                thread,
                interrupt,
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(init_error(e.to_string()))
            }
            Err(_) => {
                let _ = thread.join();
                Err(init_error(
                    "sandbox thread exited during initialization".to_string(),
                ))
            }
        }
    }

    fn shutdown(self) {
        let Worker { jobs, thread, .. } = self;
        drop(jobs);
        if thread.join().is_err() {
            tracing::warn!("sandbox thread panicked during shutdown");
        }
    }
}

fn init_sandbox(
    factory: &dyn SandboxFactory,
    source: &str,
    convention: CallConvention,
) -> Result<Box<dyn Sandbox>, SandboxError> {
    let mut sandbox = factory.create()?;
    sandbox.load(MODULE_SCRIPT_NAME, source)?;
    sandbox.bind(&convention.bind_expression())?;
    Ok(sandbox)
}

enum State {
    Ready(Worker),
    Closed,
}

/// One compiler version loaded into an isolated execution environment.
///
/// `Ready -> Closed` is the only state transition. Dropping the compiler
/// closes it.
pub struct SandboxedCompiler {
    version: CompilerVersion,
    convention: CallConvention,
    engine: String,
    timeout: Option<Duration>,
    state: Mutex<State>,
}

impl SandboxedCompiler {
    /// Loads a compiler module and binds its entry point.
    ///
    /// # Arguments
    /// * `module` - Raw binary module (soljson script) bytes
    /// * `version` - Compiler version the module was published as
    /// * `factory` - Engine used to create the sandbox
    /// * `options` - Hosting options
    pub fn new(
        module: Vec<u8>,
        version: &str,
        factory: Arc<dyn SandboxFactory>,
        options: SandboxOptions,
    ) -> Result<Self, SolcError> {
        let version = CompilerVersion::parse(version)?;
        let convention = CallConvention::for_version(&version);
        let source = String::from_utf8(module).map_err(|e| SolcError::SandboxInit {
            version: version.to_string(),
            message: format!("module is not UTF-8 text: {}", e),
        })?;

        let engine = factory.name().to_string();
        let started = Instant::now();
        let worker = Worker::spawn(factory, source, convention, &version)?;
        tracing::info!(
            version = %version,
            %convention,
            engine = %engine,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compiler sandbox ready"
        );

        Ok(Self {
            version,
            convention,
            engine,
            timeout: options.timeout,
            state: Mutex::new(State::Ready(worker)),
        })
    }

    pub fn version(&self) -> &CompilerVersion {
        &self.version
    }

    /// Calling convention bound at construction.
    pub fn convention(&self) -> CallConvention {
        self.convention
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.lock(), State::Closed)
    }

    /// Compiles a standard-JSON input.
    pub fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput, SolcError> {
        let request = serde_json::to_string(input).map_err(|e| SolcError::Serialization {
            message: e.to_string(),
        })?;
        let response = self.compile_json(&request)?;
        serde_json::from_str(&response).map_err(|e| SolcError::Deserialization {
            message: e.to_string(),
        })
    }

    /// Passes serialized input to the entry point and returns its raw result.
    pub fn compile_json(&self, input: &str) -> Result<String, SolcError> {
        let state = self.lock();
        let worker = match &*state {
            State::Ready(worker) => worker,
            State::Closed => {
                return Err(SolcError::ClosedInstance {
                    version: self.version.to_string(),
                })
            }
        };

        let (reply, reply_rx) = mpsc::channel();
        let job = Job {
            args: self.convention.call_args(input),
            reply,
        };
        worker.jobs.send(job).map_err(|_| self.worker_gone())?;

        let result = match self.timeout {
            Some(timeout) => match reply_rx.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        version = %self.version,
                        seconds = timeout.as_secs(),
                        "compile call exceeded its deadline, interrupting"
                    );
                    let timed_out = SolcError::Timeout {
                        version: self.version.to_string(),
                        seconds: timeout.as_secs(),
                    };
                    let Some(interrupt) = &worker.interrupt else {
                        return Err(timed_out);
                    };
                    interrupt.interrupt();
                    // keep the lock until the sandbox is idle again
                    let late = reply_rx.recv();
                    // the worker is idle here, so a pending interrupt can only be stale
                    interrupt.cancel();
                    match late {
                        Ok(Ok(text)) => {
                            tracing::debug!(
                                version = %self.version,
                                "call finished before the interrupt took effect"
                            );
                            return Ok(text);
                        }
                        _ => return Err(timed_out),
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return Err(self.worker_gone()),
            },
            None => reply_rx.recv().map_err(|_| self.worker_gone())?,
        };

        result.map_err(|e| SolcError::Invocation {
            version: self.version.to_string(),
            message: e.to_string(),
        })
    }

    /// Tears down the sandbox. Later calls fail with `ClosedInstance`;
    /// closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.lock();
        if let State::Ready(worker) = std::mem::replace(&mut *state, State::Closed) {
            worker.shutdown();
            tracing::debug!(version = %self.version, "compiler sandbox closed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn worker_gone(&self) -> SolcError {
        SolcError::Invocation {
            version: self.version.to_string(),
            message: "sandbox thread is no longer running".to_string(),
        }
    }
}

impl Drop for SandboxedCompiler {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for SandboxedCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxedCompiler")
            .field("version", &self.version.as_str())
            .field("convention", &self.convention)
            .field("engine", &self.engine)
            .field("closed", &self.is_closed())
            .finish()
    }
}
