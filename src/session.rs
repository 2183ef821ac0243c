//! One slicing job at a time.
//!
//! Every call to [`SlicingSession::begin`] hands out a [`Ticket`] carrying a
//! request id. Only the newest ticket can move the session forward, so a
//! request that was superseded or cancelled can't overwrite a newer result
//! when it finally finishes.

use crate::toolpaths::GcodeFile;
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Slicing { progress: u8 },
    Completed(Arc<GcodeFile>),
    Failed(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    id: u64,
}

impl Ticket {
    pub fn id(&self) -> u64 { self.id }
}

#[derive(Debug)]
pub struct SlicingSession {
    state: SessionState,
    latest: u64,
}

impl Default for SlicingSession {
    fn default() -> Self {
        SlicingSession {
            state: SessionState::Idle,
            latest: 0,
        }
    }
}

impl SlicingSession {
    pub fn new() -> SlicingSession { SlicingSession::default() }

    pub fn state(&self) -> &SessionState { &self.state }

    pub fn is_slicing(&self) -> bool { matches!(self.state, SessionState::Slicing { .. }) }

    /// Start a request, superseding any request still in flight
    pub fn begin(&mut self) -> Ticket {
        if self.is_slicing() {
            warn!("request {} superseded before it finished", self.latest);
        }
        self.latest += 1;
        self.state = SessionState::Slicing { progress: 0 };
        debug!("slicing request {} started", self.latest);
        Ticket { id: self.latest }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool { ticket.id == self.latest && self.is_slicing() }

    /// Report progress, clamped to 100. Returns false for a stale ticket.
    pub fn progress(&mut self, ticket: &Ticket, progress: u8) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = SessionState::Slicing {
            progress: progress.min(100),
        };
        true
    }

    /// Commit a result. Returns false, leaving the state alone, for a stale
    /// ticket.
    pub fn complete(&mut self, ticket: Ticket, result: Arc<GcodeFile>) -> bool {
        if !self.is_current(&ticket) {
            debug!("dropping result of stale request {}", ticket.id);
            return false;
        }
        self.state = SessionState::Completed(result);
        true
    }

    /// Commit a failure. Returns false for a stale ticket.
    pub fn fail<S: Into<String>>(&mut self, ticket: Ticket, message: S) -> bool {
        if !self.is_current(&ticket) {
            debug!("dropping failure of stale request {}", ticket.id);
            return false;
        }
        self.state = SessionState::Failed(message.into());
        true
    }

    /// Abandon the request in flight, whatever it returns is ignored
    pub fn cancel(&mut self) {
        if self.is_slicing() {
            debug!("slicing request {} cancelled", self.latest);
        }
        self.latest += 1;
        self.state = SessionState::Idle;
    }

    /// Back to idle after a result or failure was shown
    pub fn reset(&mut self) { self.cancel(); }
}
