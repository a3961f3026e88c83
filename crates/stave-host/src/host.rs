//! The seam to the external virtual-machine host.
//!
//! The engine that compiles wasm bytes, owns linear memory, and links
//! imports is not part of this crate. The session controller only needs two
//! capabilities from it: instantiate a module, and run the instance's entry
//! point to completion against the emulated environment. Everything the
//! guest's system calls touch during a run is handed over in [`GuestCtx`].

use crate::error::{LoadError, TrapError};
use crate::events::EventSink;
use crate::poll::PollEmulator;
use crate::stdio::LineBuffer;
use crate::vfs::Vfs;

/// The system-call environment for one execution.
///
/// Borrowed for the duration of the entry-point call; the session
/// controller keeps exclusive ownership in between, so there is no shared
/// mutable state and no locking.
pub struct GuestCtx<'a> {
    /// The preopened virtual file tree.
    pub vfs: &'a mut Vfs,
    /// Line-buffered standard output.
    pub stdout: &'a mut LineBuffer,
    /// Line-buffered standard error.
    pub stderr: &'a mut LineBuffer,
    /// The implementation behind the poll system call. Instances route the
    /// `poll_oneoff` import here, passing their own linear memory.
    pub poll: &'a PollEmulator,
    /// Receives status and output events as they happen.
    pub events: &'a mut dyn EventSink,
}

/// An instantiated guest module, ready to run once.
pub trait GuestInstance {
    /// Run the designated entry point synchronously to completion.
    ///
    /// Fails with [`TrapError`] when the guest faults or the entry point is
    /// missing. An instance is one-shot: the session discards it after this
    /// returns, whatever the outcome.
    fn run(&mut self, ctx: &mut GuestCtx<'_>) -> Result<(), TrapError>;
}

/// Instantiates guest modules.
pub trait InstanceHost {
    /// The instance type this host produces.
    type Instance: GuestInstance;

    /// Instantiate a fresh virtual-machine instance from `module` with the
    /// given argv. The input stream is null; descriptor bindings beyond
    /// that are fixed by [`GuestCtx`] at run time.
    fn instantiate(&mut self, module: &[u8], argv: &[String]) -> Result<Self::Instance, LoadError>;
}
