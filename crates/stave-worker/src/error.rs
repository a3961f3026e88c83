//! Worker handle errors.

/// Errors surfaced through the worker handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkerError {
    /// The worker thread is gone and the channel is closed.
    #[error("worker disconnected")]
    Disconnected,

    /// No notification arrived within the requested window; the worker is
    /// still alive.
    #[error("timed out waiting for a notification")]
    Timeout,
}
