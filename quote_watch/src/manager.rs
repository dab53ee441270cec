//! Quote session manager: the controller behind the view.
//!
//! The manager owns the tracked symbol, the single live `Session` and the
//! `ViewState`. It is driven entirely by `AppEvent`s drained from one channel:
//!
//! - a symbol change tears down the current session, starts one snapshot
//!   fetch and opens one new session;
//! - a submit re-opens the session for the current symbol even if nothing
//!   changed;
//! - snapshot results are accepted only for the latest fetch ticket;
//! - stream events are accepted only from the current, still-live session.
//!
//! The old session is always closed before a new one is opened, so at most one
//! connection is ever live.
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use log::{debug, error, info};
use quote_common::Symbol;

use crate::event::{AppEvent, FetchTicket, SnapshotOutcome, StreamEvent};
use crate::session::{Session, SessionId};
use crate::shell::{UserInput, submit_enabled};
use crate::snapshot::{SnapshotSource, fetch_outcome};
use crate::stream::StreamConnector;
use crate::view::ViewState;

/// Whether the controller loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep draining events.
    Continue,
    /// Stop tracking and leave the loop.
    Exit,
}

/// Controller owning the tracked symbol, the live session and the view.
pub struct QuoteSessionManager<C: StreamConnector> {
    source: Arc<dyn SnapshotSource>,
    connector: C,
    events: Sender<AppEvent>,
    form: String,
    tracked: Option<Symbol>,
    session: Option<Session>,
    next_session: u64,
    next_ticket: u64,
    pending_fetch: Option<FetchTicket>,
    view: ViewState,
}

impl<C: StreamConnector> QuoteSessionManager<C> {
    /// Create an idle manager. `events` is the sending side of the channel
    /// the controller drains; workers report back through it.
    pub fn new(source: Arc<dyn SnapshotSource>, connector: C, events: Sender<AppEvent>) -> Self {
        QuoteSessionManager {
            source,
            connector,
            events,
            form: String::new(),
            tracked: None,
            session: None,
            next_session: 0,
            next_ticket: 0,
            pending_fetch: None,
            view: ViewState::default(),
        }
    }

    /// Raw form value as typed.
    pub fn form(&self) -> &str {
        &self.form
    }

    /// Currently tracked symbol, if the form is not blank.
    pub fn tracked(&self) -> Option<&Symbol> {
        self.tracked.as_ref()
    }

    /// Current view state.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Current session, live or closed.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Consume one event.
    pub fn handle(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Input(UserInput::SetSymbol(raw)) => self.set_symbol(&raw),
            AppEvent::Input(UserInput::Submit) => self.submit(),
            AppEvent::Input(UserInput::Quit) | AppEvent::Shutdown => return Flow::Exit,
            AppEvent::SnapshotResolved { ticket, symbol, outcome } => {
                self.snapshot_resolved(ticket, &symbol, outcome)
            }
            AppEvent::Stream { session, event } => self.stream_event(session, event),
        }
        Flow::Continue
    }

    /// Record a new form value. Unchanged values are ignored; blank values
    /// stop tracking; anything else fetches a snapshot and opens a stream.
    pub fn set_symbol(&mut self, raw: &str) {
        if raw == self.form {
            return;
        }
        self.form = raw.to_string();
        self.teardown();

        match Symbol::parse(raw) {
            None => {
                debug!("Symbol cleared; tracking stopped");
                self.tracked = None;
                if self.pending_fetch.take().is_some() {
                    self.view.loading = false;
                }
            }
            Some(symbol) => {
                info!("Tracking {}", symbol);
                self.tracked = Some(symbol.clone());
                self.fetch_snapshot(symbol.clone());
                self.replace_session(symbol);
            }
        }
    }

    /// Form submit: re-subscribe to the current symbol. Ignored while a
    /// fetch is in flight or the form is blank.
    pub fn submit(&mut self) {
        if !submit_enabled(&self.form, &self.view) {
            debug!("Submit ignored (loading={}, form={:?})", self.view.loading, self.form);
            return;
        }
        if let Some(symbol) = self.tracked.clone() {
            self.replace_session(symbol);
        }
    }

    /// Start a snapshot fetch on a worker thread.
    pub fn fetch_snapshot(&mut self, symbol: Symbol) -> FetchTicket {
        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        self.pending_fetch = Some(ticket);
        self.view.begin_fetch();

        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let worker_symbol = symbol.clone();
        let spawned = thread::Builder::new()
            .name(format!("snapshot-{}", ticket.0))
            .spawn(move || {
                let outcome = fetch_outcome(source.as_ref(), &worker_symbol);
                let resolved = AppEvent::SnapshotResolved { ticket, symbol: worker_symbol, outcome };
                if let Err(e) = events.send(resolved) {
                    debug!("Snapshot result dropped: {}", e);
                }
            });

        if let Err(e) = spawned {
            error!("Failed to start quote request for {}: {}", symbol, e);
            self.snapshot_resolved(ticket, &symbol, SnapshotOutcome::Failed(e.to_string()));
        }
        ticket
    }

    /// Open a brand-new session for `symbol`. Callers must have closed the
    /// previous one.
    pub fn open_stream(&mut self, symbol: Symbol) -> SessionId {
        self.next_session += 1;
        let id = SessionId(self.next_session);
        let mut session = Session::new(id, symbol.clone());

        match self.connector.open(id, &symbol, self.events.clone()) {
            Ok(handle) => session.start(handle),
            Err(e) => {
                error!("Session {}: failed to start stream for {}: {}", id, symbol, e);
                session.mark_closed();
                self.view.stream_failed();
            }
        }
        self.session = Some(session);
        id
    }

    /// Close the current session, then open a new one for `symbol`.
    pub fn replace_session(&mut self, symbol: Symbol) -> SessionId {
        self.teardown();
        self.open_stream(symbol)
    }

    /// Close the active session, if any.
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!("Session {}: closing ({})", session.id(), session.symbol());
            session.close();
        }
    }

    /// Close the active session and wait for its worker. Used when the view
    /// goes away.
    pub fn shutdown(mut self) {
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
    }

    fn snapshot_resolved(&mut self, ticket: FetchTicket, symbol: &Symbol, outcome: SnapshotOutcome) {
        if self.pending_fetch != Some(ticket) {
            debug!("Discarding stale snapshot for {} ({:?})", symbol, outcome);
            return;
        }
        self.pending_fetch = None;
        self.view.apply_snapshot(&outcome);
    }

    fn stream_event(&mut self, id: SessionId, event: StreamEvent) {
        let Some(session) = self.session.as_mut().filter(|s| s.id() == id) else {
            debug!("Session {}: stale event {:?}", id, event);
            return;
        };

        match event {
            StreamEvent::Opened => session.mark_open(),
            StreamEvent::Trade(sample) => {
                if session.is_live() {
                    self.view.apply_trade(sample.price);
                } else {
                    debug!("Session {}: trade after close ignored", id);
                }
            }
            StreamEvent::Error(reason) => {
                if session.is_live() {
                    error!("WebSocket error: {}", reason);
                    self.view.stream_failed();
                }
                session.mark_closed();
            }
            StreamEvent::Closed => {
                info!("WebSocket connection closed");
                session.mark_closed();
            }
        }
    }
}
