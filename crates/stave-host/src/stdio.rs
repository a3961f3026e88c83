//! Line-buffered capture of the guest's output streams.
//!
//! The guest writes arbitrary byte chunks; the caller wants one
//! notification per completed line. Bytes accumulate until a newline, then
//! the line (without its terminator) is emitted through the event sink.

use crate::events::{EventSink, SessionEvent};

/// The guest's two output categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Accumulates bytes for one output stream and emits completed lines.
#[derive(Debug)]
pub struct LineBuffer {
    stream: OutputStream,
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer for `stream`.
    pub fn new(stream: OutputStream) -> Self {
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    /// Which stream this buffer captures.
    pub fn stream(&self) -> OutputStream {
        self.stream
    }

    /// Append a chunk of guest output, emitting one event per completed
    /// line. Returns the number of bytes consumed (always the full chunk).
    pub fn write(&mut self, bytes: &[u8], sink: &mut dyn EventSink) -> usize {
        for &byte in bytes {
            if byte == b'\n' {
                self.emit_pending(sink);
            } else {
                self.pending.push(byte);
            }
        }
        bytes.len()
    }

    /// Emit any trailing partial line. Called once execution finishes so no
    /// output is silently dropped.
    pub fn flush(&mut self, sink: &mut dyn EventSink) {
        if !self.pending.is_empty() {
            self.emit_pending(sink);
        }
    }

    fn emit_pending(&mut self, sink: &mut dyn EventSink) {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        sink.emit(SessionEvent::OutputLine {
            stream: self.stream,
            line,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(events: &[SessionEvent]) -> Vec<&str> {
        events
            .iter()
            .map(|e| match e {
                SessionEvent::OutputLine { line, .. } => line.as_str(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect()
    }

    #[test]
    fn emits_one_event_per_completed_line() {
        let mut buffer = LineBuffer::new(OutputStream::Stdout);
        let mut events = Vec::new();
        buffer.write(b"first\nsec", &mut events);
        buffer.write(b"ond\n", &mut events);
        assert_eq!(lines(&events), vec!["first", "second"]);
    }

    #[test]
    fn flush_emits_trailing_partial_line() {
        let mut buffer = LineBuffer::new(OutputStream::Stderr);
        let mut events = Vec::new();
        buffer.write(b"no newline", &mut events);
        assert!(events.is_empty());
        buffer.flush(&mut events);
        assert_eq!(lines(&events), vec!["no newline"]);
        buffer.flush(&mut events);
        assert_eq!(events.len(), 1);
    }
}
