//! Session error types.

use crate::session::SessionState;

/// Module instantiation failed in the external virtual-machine host.
#[derive(Debug, Clone, thiserror::Error)]
#[error("module load failed: {0}")]
pub struct LoadError(pub String);

/// The guest faulted while executing its entry point.
#[derive(Debug, Clone, thiserror::Error)]
#[error("guest trapped: {0}")]
pub struct TrapError(pub String);

/// Errors surfaced to the session's caller.
///
/// System-call-level failures never appear here: those are returned to the
/// guest as errno values and the run carries on.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// A compile was requested while the session was not `Ready`.
    #[error("session is {0:?}, not ready to compile")]
    NotReady(SessionState),

    /// Module instantiation failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Guest execution trapped or the entry point was missing.
    #[error(transparent)]
    Trap(#[from] TrapError),
}
