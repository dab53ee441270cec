//!
//! Common types and utilities shared by the quote watcher.
//!
//! This crate aggregates:
//! - `error` — unified error type `QuoteError` used across the workspace.
//! - `result` — handy `Result<T, QuoteError>` alias.
//! - `symbol` — the tracked ticker symbol and its parsing rules.
//! - `quote` — the point-in-time quote returned by the REST endpoint.
//! - `stream` — JSON messages exchanged over the streaming connection.
//! - `net` — default endpoints and URL helpers.
#![warn(missing_docs)]
pub mod error;
pub mod net;
pub mod quote;
pub mod result;
pub mod stream;
pub mod symbol;

pub use error::QuoteError;
pub use quote::Quote;
pub use result::Result;
pub use stream::{StreamCommand, StreamMessage, TradeSample};
pub use symbol::Symbol;
