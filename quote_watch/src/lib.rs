//! Quote Watch — track one ticker at a time from the terminal.
//!
//! Typing a symbol fetches a point-in-time quote over REST and subscribes to
//! a streaming feed; every trade on the stream replaces the displayed price.
//! Changing the symbol closes the previous stream before the next one opens.
//!
//! Modules:
//! - `args` — command-line and environment configuration.
//! - `error` — `ClientError` and the crate `Result` alias.
//! - `event` — events drained by the controller loop.
//! - `manager` — `QuoteSessionManager`, the controller.
//! - `session` — a single stream session and its state machine.
//! - `shell` — terminal input parsing and view rendering.
//! - `snapshot` — REST quote fetch.
//! - `stream` — WebSocket worker.
//! - `view` — derived view state and user-visible messages.
#![warn(missing_docs)]
pub mod args;
pub mod error;
pub mod event;
pub mod manager;
pub mod session;
pub mod shell;
pub mod snapshot;
pub mod stream;
pub mod view;

pub use error::{ClientError, Result};
pub use manager::{Flow, QuoteSessionManager};
