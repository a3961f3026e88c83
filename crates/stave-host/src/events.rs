//! Session-to-caller notification seam.

use crate::stdio::OutputStream;

/// One notification emitted by the session while servicing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Human-readable progress line.
    Status(String),
    /// One completed line from an output stream.
    OutputLine {
        /// Which output category produced the line.
        stream: OutputStream,
        /// The line, without its terminator.
        line: String,
    },
}

/// Receives session events as they happen.
///
/// The worker layer forwards these over its notification channel; tests
/// collect them into a `Vec`.
pub trait EventSink {
    /// Deliver one event. Delivery is ordered and lossless.
    fn emit(&mut self, event: SessionEvent);
}

/// In-memory sink, used by tests.
impl EventSink for Vec<SessionEvent> {
    fn emit(&mut self, event: SessionEvent) {
        self.push(event)
    }
}
