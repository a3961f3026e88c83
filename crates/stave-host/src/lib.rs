//! Host-side emulation core for running a sandboxed compiler inside a
//! WebAssembly-style guest with no real blocking I/O.
//!
//! The browser sandbox the guest targets has no threads, no file
//! descriptors, and no wall-clock wait, so the WASI surface the compiler
//! needs is reimplemented here: an event-polling emulation ([`poll`]), an
//! in-memory virtual directory tree ([`vfs`]) rooted at a few preopened
//! mounts, line-buffered output capture ([`stdio`]), and a session
//! controller ([`session`]) that turns the guest's one-shot synchronous
//! execution into a repeatable compile-then-reset service.
//!
//! The virtual-machine engine itself (module compilation, linear memory,
//! import linking) stays external, reached through the traits in [`host`].

#![warn(missing_docs)]

pub mod host;
pub mod poll;
pub mod session;
pub mod stdio;
pub mod testing;
pub mod vfs;

mod error;
mod events;

pub use error::{LoadError, SessionError, TrapError};
pub use host::{GuestCtx, GuestInstance, InstanceHost};
pub use events::{EventSink, SessionEvent};
pub use poll::{ClockMode, PollConfig, PollEmulator};
pub use session::{CompileOutcome, Session, SessionOptions, SessionState};
pub use stdio::{LineBuffer, OutputStream};
pub use vfs::{DirTree, FileSnapshot, Node, Vfs};
