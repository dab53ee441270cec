//! Error types shared across the workspace.
//!
//! The `QuoteError` enum unifies the failure cases that do not depend on a
//! particular transport: symbol parsing and JSON handling.
use thiserror::Error;

/// Unified error type for symbol and payload failures.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The supplied text is not a usable ticker symbol (empty or blank).
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
