//! Asynchronous boundary between the presentation layer and a compiler
//! session.
//!
//! Two unidirectional typed channels connect the caller and the session:
//! commands in ([`Command`]), notifications out ([`Notification`]). Both
//! are ordered and lossless. The session itself runs on a dedicated worker
//! thread ([`WorkerHandle`]); the caller-side contract (send `Load` first,
//! wait for [`Notification::Ready`] before `Compile`) mirrors the message
//! discipline of the original browser worker.

#![warn(missing_docs)]

pub mod protocol;
pub mod worker;

mod error;

pub use error::WorkerError;
pub use protocol::{Command, Notification, OutputFormat, StreamKind};
pub use worker::{WorkerConfig, WorkerHandle};
