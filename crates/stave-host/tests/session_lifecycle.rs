//! Session controller lifecycle tests.
//!
//! Drive a session end-to-end against the scripted guest: load, compile,
//! self re-arm, and failure handling.

use stave_host::testing::{GuestScript, ScriptedHost};
use stave_host::{
    OutputStream, Session, SessionError, SessionEvent, SessionOptions, SessionState,
};

const MODULE: &[u8] = b"\0asm-fake-module";

fn ready_session() -> (Session<ScriptedHost>, Vec<SessionEvent>) {
    let mut events = Vec::new();
    let mut session = Session::new(
        ScriptedHost::new(GuestScript::engraver()),
        SessionOptions::default(),
    );
    session.load(MODULE, &mut events).unwrap();
    (session, events)
}

// ===== load =====

#[test]
fn load_transitions_to_ready_and_reports_status() {
    let (session, events) = ready_session();
    assert_eq!(session.state(), SessionState::Ready);

    let statuses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Status(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(statuses.len(), 2, "one status before and one after instantiation");
    assert!(statuses[0].contains("Loading"));
    assert!(statuses[1].contains("initialized"));
}

#[test]
fn failed_load_leaves_session_loading() {
    let mut events = Vec::new();
    let mut session = Session::new(
        ScriptedHost::failing("no such module"),
        SessionOptions::default(),
    );
    let err = session.load(MODULE, &mut events).unwrap_err();
    assert!(matches!(err, SessionError::Load(_)));
    assert_eq!(session.state(), SessionState::Loading);
}

// ===== compile =====

#[test]
fn compile_produces_snapshot_and_rearms() {
    let (mut session, _) = ready_session();
    let mut events = Vec::new();

    let outcome = session
        .compile("{ c' d' e' }", &mut events)
        .expect("compile succeeds");

    assert_eq!(session.state(), SessionState::Ready, "session self re-arms");
    assert!(!outcome.files.is_empty());
    // Artifact content carries the submitted source through the tree.
    let artifact = &outcome.files["main.png"];
    assert!(artifact.ends_with(b"{ c' d' e' }"));
    // The source file itself is part of the walked tree.
    assert_eq!(outcome.files["main.ly"], b"{ c' d' e' }".to_vec());
}

#[test]
fn compile_reports_output_lines_in_emission_order() {
    let (mut session, _) = ready_session();
    let mut events = Vec::new();
    session.compile("{}", &mut events).unwrap();

    let stdout: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::OutputLine {
                stream: OutputStream::Stdout,
                line,
            } => Some(line.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stdout, vec!["Processing score"]);

    let stderr: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::OutputLine {
                stream: OutputStream::Stderr,
                line,
            } => Some(line.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stderr, vec!["warning: no version statement"]);
}

#[test]
fn compile_discards_the_previous_instance() {
    let (mut session, _) = ready_session();
    assert_eq!(session.host().instantiations, 1);

    let mut events = Vec::new();
    session.compile("{}", &mut events).unwrap();
    // Self re-arm instantiates a fresh instance from the retained bytes.
    assert_eq!(session.host().instantiations, 2);
}

#[test]
fn second_compile_succeeds_without_external_reload() {
    let (mut session, _) = ready_session();
    let mut events = Vec::new();

    let first = session.compile("first", &mut events).unwrap();
    let second = session.compile("second", &mut events).unwrap();

    assert!(first.files["main.png"].ends_with(b"first"));
    assert!(second.files["main.png"].ends_with(b"second"));
    assert!(
        !second.files["main.png"].ends_with(b"firstsecond"),
        "file tree contents must be request-scoped"
    );
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn compile_records_nonnegative_duration() {
    let (mut session, _) = ready_session();
    let mut events = Vec::new();
    let outcome = session.compile("{}", &mut events).unwrap();
    // Wall time is measured around the run itself; a scripted guest should
    // finish well within a minute.
    assert!(outcome.duration.as_secs() < 60);
}

#[test]
fn compile_before_load_is_not_ready() {
    let mut events = Vec::new();
    let mut session = Session::new(
        ScriptedHost::new(GuestScript::engraver()),
        SessionOptions::default(),
    );
    let err = session.compile("{}", &mut events).unwrap_err();
    assert!(matches!(
        err,
        SessionError::NotReady(SessionState::Uninitialized)
    ));
}

#[test]
fn compile_while_loading_is_not_ready() {
    let mut events = Vec::new();
    let mut session = Session::new(
        ScriptedHost::failing("unreachable module"),
        SessionOptions::default(),
    );
    let _ = session.load(MODULE, &mut events);
    assert_eq!(session.state(), SessionState::Loading);

    let err = session.compile("{}", &mut events).unwrap_err();
    assert!(matches!(err, SessionError::NotReady(SessionState::Loading)));
}

#[test]
fn compile_keeps_artifacts_when_rearm_fails() {
    let mut host = ScriptedHost::new(GuestScript::engraver());
    host.fail_load_after = Some(1);
    let mut events = Vec::new();
    let mut session = Session::new(host, SessionOptions::default());
    session.load(MODULE, &mut events).unwrap();

    // The compile itself succeeded; the engine only broke afterwards, so
    // the caller still gets the produced files.
    let outcome = session
        .compile("{ c' }", &mut events)
        .expect("compile outcome survives a failed re-arm");
    assert!(outcome.files["main.png"].ends_with(b"{ c' }"));

    assert_eq!(session.state(), SessionState::Loading);
    let err = session.compile("{}", &mut events).unwrap_err();
    assert!(matches!(err, SessionError::NotReady(SessionState::Loading)));
}

// ===== trap handling =====

#[test]
fn trap_fails_the_call_but_session_rearms() {
    let mut script = GuestScript::engraver();
    script.trap = Some("unreachable executed".to_string());
    let mut events = Vec::new();
    let mut session = Session::new(ScriptedHost::new(script), SessionOptions::default());
    session.load(MODULE, &mut events).unwrap();

    let err = session.compile("{}", &mut events).unwrap_err();
    assert!(matches!(err, SessionError::Trap(_)));
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Status(text) if text.contains("failed")
    )));
    // Re-armed: the controller remains usable after a trap.
    assert_eq!(session.state(), SessionState::Ready);
}

// ===== poll wiring =====

#[test]
fn guest_poll_goes_through_the_emulator() {
    // GuestScript::engraver polls once before writing artifacts and traps
    // if the emulated poll misbehaves, so a successful compile proves the
    // import trampoline round-trip.
    let (mut session, _) = ready_session();
    let mut events = Vec::new();
    assert!(session.compile("{}", &mut events).is_ok());
}
