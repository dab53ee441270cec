//! Error types used across the quote watcher.
//!
//! The `ClientError` enum adds the transport failures (HTTP and WebSocket) on
//! top of the shared `QuoteError`, so that everything in this crate can be
//! propagated with `Result<T, ClientError>`.
use std::io;

use quote_common::QuoteError;
use thiserror::Error;

/// Unified error type for the watcher.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Error from the shared crate (symbol parsing, JSON).
    #[error(transparent)]
    Quote(#[from] QuoteError),

    /// I/O error from sockets, including connect and handshake timeouts.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// REST request failed: connection, non-success status or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Streaming connection failed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// TLS setup or handshake for a `wss://` stream failed.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// The Ctrl+C handler could not be installed.
    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),

    /// Crossbeam/channel send failed; contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Crossbeam/channel receive failed; contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),
}

/// Crate-wide `Result` alias with `ClientError` as the default error.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
