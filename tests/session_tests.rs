use printer_plate::{
    session::{SessionState, SlicingSession},
    toolpaths::GcodeFile,
};
use std::sync::Arc;

fn gcode(name: &str) -> Arc<GcodeFile> { Arc::new(GcodeFile::new(name, b"G1 X1 E1\n".to_vec())) }

#[test]
fn starts_idle() {
    let session = SlicingSession::new();
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(!session.is_slicing());
}

#[test]
fn progress_is_clamped() {
    let mut session = SlicingSession::new();
    let ticket = session.begin();
    assert!(session.progress(&ticket, 40));
    assert_eq!(session.state(), &SessionState::Slicing { progress: 40 });
    assert!(session.progress(&ticket, 250));
    assert_eq!(session.state(), &SessionState::Slicing { progress: 100 });
}

#[test]
fn newest_request_wins() {
    let mut session = SlicingSession::new();
    let old = session.begin();
    let new = session.begin();
    assert!(!session.is_current(&old));
    assert!(!session.complete(old, gcode("old.gcode")));
    assert_eq!(session.state(), &SessionState::Slicing { progress: 0 });
    let result = gcode("new.gcode");
    assert!(session.complete(new, result.clone()));
    assert_eq!(session.state(), &SessionState::Completed(result));
}

#[test]
fn stale_failure_is_ignored() {
    let mut session = SlicingSession::new();
    let old = session.begin();
    let new = session.begin();
    assert!(!session.fail(old, "timed out"));
    assert!(session.is_current(&new));
    assert!(session.fail(new, "timed out"));
    assert_eq!(session.state(), &SessionState::Failed("timed out".to_string()));
}

#[test]
fn cancelled_request_cannot_commit() {
    let mut session = SlicingSession::new();
    let ticket = session.begin();
    session.cancel();
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(!session.progress(&ticket, 50));
    assert!(!session.complete(ticket, gcode("late.gcode")));
    assert_eq!(session.state(), &SessionState::Idle);
}

#[test]
fn finished_request_cannot_commit_twice() {
    let mut session = SlicingSession::new();
    let ticket = session.begin();
    let id = ticket.id();
    assert!(session.fail(ticket, "bad mesh"));
    let next = session.begin();
    assert!(next.id() > id);
    session.reset();
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(!session.complete(next, gcode("a.gcode")));
}
