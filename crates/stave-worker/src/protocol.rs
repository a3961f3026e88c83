//! Wire-level command and notification types.
//!
//! Serde representations use externally visible kebab-case type tags, the
//! same shape the original page/worker messages had, so a JSON transport
//! drops in without an adapter layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stave_host::OutputStream;

/// Output format the caller wants the compiler to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Rasterized image output.
    Png,
    /// Scalable vector output.
    Svg,
    /// Portable document output.
    Pdf,
}

impl OutputFormat {
    /// The compiler flag selecting this format.
    pub const fn flag(self) -> &'static str {
        match self {
            OutputFormat::Png => "--png",
            OutputFormat::Svg => "--svg",
            OutputFormat::Pdf => "--pdf",
        }
    }
}

/// Caller-to-worker commands.
///
/// Ordering discipline is a caller contract: `Compile` must not be sent
/// before a `Ready` notification has been observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    /// Load (or reload) the compiler module.
    Load {
        /// Optional output-format hint, mapped onto the guest argv.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_format: Option<OutputFormat>,
    },
    /// Compile one source text.
    Compile {
        /// The full source to compile.
        source: String,
    },
}

/// Which output category a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl From<OutputStream> for StreamKind {
    fn from(stream: OutputStream) -> Self {
        match stream {
            OutputStream::Stdout => StreamKind::Stdout,
            OutputStream::Stderr => StreamKind::Stderr,
        }
    }
}

/// Worker-to-caller notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notification {
    /// The session reached `Ready`; a compile may be sent.
    Ready,
    /// Human-readable progress line.
    StatusUpdate {
        /// The status text.
        value: String,
    },
    /// One completed output line.
    Output {
        /// Which stream produced the line.
        stream: StreamKind,
        /// The line, without its terminator.
        value: String,
    },
    /// Terminal notification for a `Compile` command.
    Result {
        /// Every produced file, keyed by slash-joined relative path.
        files: BTreeMap<String, Vec<u8>>,
        /// Wall time of the run in milliseconds.
        duration_millis: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_shape_matches_original_messages() {
        let json = serde_json::to_value(Command::Compile {
            source: "{ c' }".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "compile");
        assert_eq!(json["source"], "{ c' }");

        let load: Command = serde_json::from_str(r#"{"type":"load"}"#).unwrap();
        assert_eq!(load, Command::Load { output_format: None });

        let load: Command =
            serde_json::from_str(r#"{"type":"load","output_format":"svg"}"#).unwrap();
        assert_eq!(
            load,
            Command::Load {
                output_format: Some(OutputFormat::Svg)
            }
        );
    }

    #[test]
    fn notification_wire_shape_is_tagged() {
        let json = serde_json::to_value(Notification::Output {
            stream: StreamKind::Stderr,
            value: "warning".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "output");
        assert_eq!(json["stream"], "stderr");

        let json = serde_json::to_value(Notification::Ready).unwrap();
        assert_eq!(json["type"], "ready");
    }
}
