//! A single live stream session and its state machine.
//!
//! A session moves `Idle -> Connecting -> Open -> Closed` and never leaves
//! `Closed`; tracking a new symbol (or resubmitting) always creates a new
//! session with a fresh id.
use std::fmt;

use log::{debug, warn};
use quote_common::Symbol;
use strum_macros::Display;

use crate::stream::StreamHandle;

/// Monotonic identifier tagging every event a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    /// Created, worker not started.
    Idle,
    /// Worker started, connection not yet confirmed.
    Connecting,
    /// Connected and subscribed.
    Open,
    /// Closed by either side or after an error. Terminal.
    Closed,
}

/// The live connection for the tracked symbol.
pub struct Session {
    id: SessionId,
    symbol: Symbol,
    state: SessionState,
    handle: Option<StreamHandle>,
}

impl Session {
    /// New session in the `Idle` state.
    pub fn new(id: SessionId, symbol: Symbol) -> Self {
        Session {
            id,
            symbol,
            state: SessionState::Idle,
            handle: None,
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Symbol this session subscribed to.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether events from this session may still update the view.
    pub fn is_live(&self) -> bool {
        matches!(self.state, SessionState::Connecting | SessionState::Open)
    }

    /// `Idle -> Connecting`, taking ownership of the worker handle.
    pub fn start(&mut self, handle: StreamHandle) {
        debug_assert_eq!(self.state, SessionState::Idle);
        self.handle = Some(handle);
        self.transition(SessionState::Connecting);
    }

    /// `Connecting -> Open`.
    pub fn mark_open(&mut self) {
        if self.state == SessionState::Connecting {
            self.transition(SessionState::Open);
        }
    }

    /// Worker reported an error or a close; the connection is gone.
    pub fn mark_closed(&mut self) {
        self.transition(SessionState::Closed);
    }

    /// Ask the worker to close the connection. Idempotent.
    pub fn close(&mut self) {
        if let Some(handle) = &self.handle {
            handle.close();
        }
        self.transition(SessionState::Closed);
    }

    /// Close and wait, bounded, for the worker thread to finish.
    pub fn shutdown(mut self) {
        self.close();
        if let Some(handle) = self.handle.take() {
            if !handle.join() {
                warn!("Session {} ({}): worker did not exit in time", self.id, self.symbol);
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next && self.state != SessionState::Closed {
            debug!("Session {} ({}): {} -> {}", self.id, self.symbol, self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SessionId(1), "AAPL".parse().unwrap())
    }

    #[test]
    fn walks_the_happy_path() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Idle);
        let handle = StreamHandle::detached();
        let flag = handle.close_flag();
        s.start(handle);
        assert_eq!(s.state(), SessionState::Connecting);
        assert!(s.is_live());
        s.mark_open();
        assert_eq!(s.state(), SessionState::Open);
        s.close();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn closed_is_terminal() {
        let mut s = session();
        s.start(StreamHandle::detached());
        s.mark_closed();
        s.mark_open();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(!s.is_live());
    }

    #[test]
    fn open_only_from_connecting() {
        let mut s = session();
        s.mark_open();
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn state_display_is_lowercase() {
        assert_eq!(SessionState::Connecting.to_string(), "connecting");
    }
}
