//! The worker thread that owns a session and services commands.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tracing::warn;

use stave_host::host::InstanceHost;
use stave_host::{EventSink, Session, SessionEvent, SessionOptions, SessionState};

use crate::error::WorkerError;
use crate::protocol::{Command, Notification, OutputFormat};

/// Everything a worker needs to run: the compiler module bytes and the
/// session configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// The guest compiler module.
    pub module: Vec<u8>,
    /// Session configuration, including the base argv a format hint is
    /// applied to.
    pub session: SessionOptions,
}

/// Caller-side handle to a worker thread.
///
/// Dropping the handle closes the command channel; the worker finishes the
/// in-flight command and exits.
pub struct WorkerHandle {
    commands: Option<Sender<Command>>,
    notifications: Receiver<Notification>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn a worker thread owning one session backed by `host`.
    pub fn spawn<H>(host: H, config: WorkerConfig) -> Self
    where
        H: InstanceHost + Send + 'static,
    {
        let (command_tx, command_rx) = channel::unbounded();
        let (notification_tx, notification_rx) = channel::unbounded();
        let thread = thread::spawn(move || {
            worker_loop(host, config, command_rx, notification_tx);
        });
        Self {
            commands: Some(command_tx),
            notifications: notification_rx,
            thread: Some(thread),
        }
    }

    /// Send one command to the worker.
    pub fn send(&self, command: Command) -> Result<(), WorkerError> {
        self.commands
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(command)
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Block for the next notification.
    pub fn recv(&self) -> Result<Notification, WorkerError> {
        self.notifications.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// Block for the next notification, up to `timeout`.
    ///
    /// [`WorkerError::Timeout`] means the worker is merely slow;
    /// [`WorkerError::Disconnected`] means it is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Notification, WorkerError> {
        self.notifications.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => WorkerError::Timeout,
            RecvTimeoutError::Disconnected => WorkerError::Disconnected,
        })
    }

    /// The raw notification channel, for callers that select over it.
    pub fn notifications(&self) -> &Receiver<Notification> {
        &self.notifications
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.commands = None;
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop<H: InstanceHost>(
    host: H,
    config: WorkerConfig,
    commands: Receiver<Command>,
    notifications: Sender<Notification>,
) {
    let base_argv = config.session.argv.clone();
    let mut session = Session::new(host, config.session);
    let module = config.module;

    while let Ok(command) = commands.recv() {
        match command {
            Command::Load { output_format } => {
                // Every load starts from the configured base argv; a hint
                // only applies to the load that carried it.
                let argv = match output_format {
                    Some(format) => apply_format(base_argv.clone(), format),
                    None => base_argv.clone(),
                };
                session.set_argv(argv);
                let mut sink = ChannelSink(&notifications);
                match session.load(&module, &mut sink) {
                    Ok(()) => {
                        let _ = notifications.send(Notification::Ready);
                    }
                    Err(err) => {
                        // Failure detail already went out as a status line.
                        warn!("load failed: {err}");
                    }
                }
            }
            Command::Compile { source } => {
                let mut sink = ChannelSink(&notifications);
                match session.compile(&source, &mut sink) {
                    Ok(outcome) => {
                        let seconds = outcome.duration.as_secs_f64();
                        let _ = notifications.send(Notification::Result {
                            files: outcome.files,
                            duration_millis: outcome.duration.as_millis() as u64,
                        });
                        let _ = notifications.send(Notification::StatusUpdate {
                            value: format!("Compiled in {seconds:.2} seconds"),
                        });
                        // The session re-armed itself before returning.
                        let _ = notifications.send(Notification::Ready);
                    }
                    Err(err) => {
                        warn!("compile failed: {err}");
                        // The session re-arms itself even after a trap; tell
                        // the caller it may compile again without reloading.
                        if session.state() == SessionState::Ready {
                            let _ = notifications.send(Notification::Ready);
                        }
                    }
                }
            }
        }
    }
}

/// Replace the format flag in `argv`, or insert the requested one before
/// the trailing input argument.
fn apply_format(mut argv: Vec<String>, format: OutputFormat) -> Vec<String> {
    const FORMAT_FLAGS: [&str; 3] = ["--png", "--svg", "--pdf"];
    let flag = format.flag().to_string();
    if let Some(slot) = argv
        .iter_mut()
        .find(|arg| FORMAT_FLAGS.contains(&arg.as_str()))
    {
        *slot = flag;
    } else if argv.len() >= 2 {
        let before_input = argv.len() - 1;
        argv.insert(before_input, flag);
    } else {
        argv.push(flag);
    }
    argv
}

struct ChannelSink<'a>(&'a Sender<Notification>);

impl EventSink for ChannelSink<'_> {
    fn emit(&mut self, event: SessionEvent) {
        let notification = match event {
            SessionEvent::Status(value) => Notification::StatusUpdate { value },
            SessionEvent::OutputLine { stream, line } => Notification::Output {
                stream: stream.into(),
                value: line,
            },
        };
        let _ = self.0.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn format_hint_replaces_existing_flag() {
        let out = apply_format(argv(&["arg0", "engrave", "--png", "main"]), OutputFormat::Svg);
        assert_eq!(out, argv(&["arg0", "engrave", "--svg", "main"]));
    }

    #[test]
    fn format_hint_inserts_before_input_argument() {
        let out = apply_format(argv(&["arg0", "main"]), OutputFormat::Pdf);
        assert_eq!(out, argv(&["arg0", "--pdf", "main"]));
    }

    #[test]
    fn format_hint_appends_when_argv_is_bare() {
        let out = apply_format(argv(&["arg0"]), OutputFormat::Png);
        assert_eq!(out, argv(&["arg0", "--png"]));
    }
}
