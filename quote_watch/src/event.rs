//! Events drained by the controller loop.
//!
//! Every asynchronous boundary (terminal input, snapshot fetch, stream worker,
//! Ctrl+C) talks to the controller by sending an `AppEvent` over a single
//! `crossbeam_channel`, so the controller sees one event at a time in arrival
//! order.
use quote_common::{Symbol, TradeSample};

use crate::session::SessionId;
use crate::shell::UserInput;

/// Identifies one snapshot request; only the latest ticket may update the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(pub u64);

/// Result of a snapshot fetch, already classified for the view.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// The quote carried a usable current price.
    Price(f64),
    /// The request succeeded but the quote had no usable price.
    InvalidSymbol,
    /// Transport, status or decoding failure.
    Failed(String),
}

/// Notification from a stream worker.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Connected and subscribe sent.
    Opened,
    /// A trade message with at least one sample arrived.
    Trade(TradeSample),
    /// Transport-level failure; the worker has stopped.
    Error(String),
    /// The connection closed; the worker has stopped.
    Closed,
}

/// Everything the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Parsed terminal input.
    Input(UserInput),
    /// A snapshot fetch completed.
    SnapshotResolved {
        /// Ticket issued when the fetch started.
        ticket: FetchTicket,
        /// Symbol the fetch targeted.
        symbol: Symbol,
        /// Classified result.
        outcome: SnapshotOutcome,
    },
    /// Something happened on a stream session.
    Stream {
        /// Session that produced the event.
        session: SessionId,
        /// What happened.
        event: StreamEvent,
    },
    /// Stop tracking and exit.
    Shutdown,
}
