//! Compilation session controller.
//!
//! Turns the guest's one-shot synchronous execution into a multi-request
//! compile-then-reset service: load instantiates a fresh instance, compile
//! runs it once against a request-scoped file tree, snapshots the produced
//! artifacts, and immediately re-arms for the next request.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{SessionError, TrapError};
use crate::events::{EventSink, SessionEvent};
use crate::host::{GuestCtx, GuestInstance, InstanceHost};
use crate::poll::{PollConfig, PollEmulator};
use crate::stdio::{LineBuffer, OutputStream};
use crate::vfs::{FileSnapshot, Vfs, APP_MOUNT};

/// Session lifecycle phase.
///
/// `Running → Loading` happens inside `compile` itself: the controller
/// always re-initializes before becoming ready again, discarding the
/// previous instance. There is no error state; failures leave the session
/// reloadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No load has been requested yet.
    Uninitialized,
    /// A load is in progress or the last load failed.
    Loading,
    /// An instance is armed and a compile may proceed.
    Ready,
    /// A compile is executing.
    Running,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Name the submitted source is written under in the `/app` mount.
    pub source_filename: String,
    /// Guest argv, including argv\[0\].
    pub argv: Vec<String>,
    /// Poll emulation policy.
    pub poll: PollConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            source_filename: "main.ly".to_string(),
            argv: vec!["arg0".to_string()],
            poll: PollConfig::default(),
        }
    }
}

/// The result of one successful compile run.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Every leaf of the virtual tree after execution, keyed by
    /// slash-joined relative path.
    pub files: FileSnapshot,
    /// Wall time from entry to completion.
    pub duration: Duration,
}

/// Owns one guest compiler and services compile requests sequentially.
pub struct Session<H: InstanceHost> {
    host: H,
    options: SessionOptions,
    poll: PollEmulator,
    vfs: Vfs,
    state: SessionState,
    module: Vec<u8>,
    instance: Option<H::Instance>,
}

impl<H: InstanceHost> Session<H> {
    /// Create an unloaded session.
    pub fn new(host: H, options: SessionOptions) -> Self {
        let poll = PollEmulator::new(options.poll);
        Self {
            host,
            options,
            poll,
            vfs: Vfs::new(),
            state: SessionState::Uninitialized,
            module: Vec::new(),
            instance: None,
        }
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The instance host backing this session.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Replace the guest argv used for subsequent loads.
    pub fn set_argv(&mut self, argv: Vec<String>) {
        self.options.argv = argv;
    }

    /// Instantiate a fresh guest instance from `module`.
    ///
    /// The module bytes are retained so the session can re-arm itself after
    /// each compile. On failure the session stays in `Loading` and a later
    /// `load` may retry.
    pub fn load(
        &mut self,
        module: &[u8],
        events: &mut dyn EventSink,
    ) -> Result<(), SessionError> {
        self.module = module.to_vec();
        self.arm(events)
    }

    /// Compile `source` and return the produced artifacts.
    ///
    /// Writes the source into `/app`, runs the armed instance to
    /// completion, snapshots every leaf of the virtual tree, then re-arms
    /// by reloading the retained module before returning. On a guest trap
    /// the failure is reported for this call only; the session still
    /// re-arms so the next compile can proceed. A re-arm failure after a
    /// successful run surfaces as a status line only: the artifacts are
    /// returned and the session stays in `Loading` until a later load.
    pub fn compile(
        &mut self,
        source: &str,
        events: &mut dyn EventSink,
    ) -> Result<CompileOutcome, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotReady(self.state));
        }
        self.state = SessionState::Running;
        status(events, "Running compiler...");

        let filename = self.options.source_filename.clone();
        self.vfs
            .write_file(APP_MOUNT, &filename, source.as_bytes().to_vec());

        // The Ready guard guarantees an armed instance.
        let mut instance = match self.instance.take() {
            Some(instance) => instance,
            None => {
                return Err(SessionError::Trap(TrapError(
                    "ready session has no armed instance".to_string(),
                )))
            }
        };

        let mut stdout = LineBuffer::new(OutputStream::Stdout);
        let mut stderr = LineBuffer::new(OutputStream::Stderr);
        let started = Instant::now();
        let run = {
            let mut ctx = GuestCtx {
                vfs: &mut self.vfs,
                stdout: &mut stdout,
                stderr: &mut stderr,
                poll: &self.poll,
                events: &mut *events,
            };
            instance.run(&mut ctx)
        };
        let duration = started.elapsed();
        stdout.flush(events);
        stderr.flush(events);

        if let Err(trap) = run {
            status(events, &format!("Compiler execution failed: {trap}"));
            // Re-arm anyway; one faulted run must not wedge the session.
            let _ = self.arm(events);
            return Err(SessionError::Trap(trap));
        }
        status(events, "Compiler execution complete");

        let files = self.vfs.snapshot();
        debug!(files = files.len(), ?duration, "compile run finished");

        // The run already succeeded; a failed re-arm must not discard its
        // artifacts. It surfaces as a status line, leaves the session in
        // `Loading`, and a later load can retry.
        if let Err(err) = self.arm(events) {
            warn!("re-arm after compile failed: {err}");
        }
        Ok(CompileOutcome { files, duration })
    }

    /// `* → Loading → Ready`: reset the file tree and instantiate a fresh
    /// instance from the retained module bytes.
    fn arm(&mut self, events: &mut dyn EventSink) -> Result<(), SessionError> {
        self.state = SessionState::Loading;
        self.instance = None;
        self.vfs.clear();
        status(
            events,
            &format!("Loading compiler module ({} bytes)", self.module.len()),
        );
        match self.host.instantiate(&self.module, &self.options.argv) {
            Ok(instance) => {
                self.instance = Some(instance);
                self.state = SessionState::Ready;
                debug!(state = ?self.state, "session armed");
                status(events, "Compiler initialized");
                Ok(())
            }
            Err(err) => {
                status(events, &format!("Compiler load failed: {err}"));
                Err(SessionError::Load(err))
            }
        }
    }
}

fn status(events: &mut dyn EventSink, text: &str) {
    events.emit(SessionEvent::Status(text.to_string()));
}
