//! Streaming protocol messages.
//!
//! The client sends a single `subscribe` command right after connecting. The
//! server pushes JSON objects tagged by `type`; only `trade` messages carry
//! prices, everything else (`ping`, errors, unknown kinds) is ignored.
use serde::{Deserialize, Serialize};

use crate::symbol::Symbol;

/// Command sent from client to the streaming server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamCommand {
    /// Start receiving trades for `symbol`.
    Subscribe {
        /// Symbol to subscribe to.
        symbol: Symbol,
    },
}

impl StreamCommand {
    /// Creates a subscription command for `symbol`.
    pub fn subscribe(symbol: Symbol) -> Self {
        StreamCommand::Subscribe { symbol }
    }

    /// Encode the command as a JSON text frame payload.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A single trade sample inside a `trade` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSample {
    /// Traded price. Required: a `trade` frame with any sample missing it is
    /// rejected as a whole.
    #[serde(rename = "p")]
    pub price: f64,
    /// Symbol the trade belongs to.
    #[serde(rename = "s", default)]
    pub symbol: Option<String>,
    /// Trade time in milliseconds since the UNIX epoch.
    #[serde(rename = "t", default)]
    pub timestamp: Option<i64>,
    /// Traded volume.
    #[serde(rename = "v", default)]
    pub volume: Option<f64>,
}

/// Message pushed by the streaming server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamMessage {
    /// One or more trades.
    Trade {
        /// Trade samples; may be empty.
        #[serde(default)]
        data: Vec<TradeSample>,
    },
    /// Keep-alive from the server.
    Ping,
    /// Any other message kind.
    #[serde(other)]
    Other,
}

impl StreamMessage {
    /// Decode a text frame. Frames that are not JSON objects with a `type`
    /// tag are reported as errors so the caller can log and skip them.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The sample that drives the displayed price: the first entry of a
    /// non-empty `trade` message.
    pub fn price_sample(&self) -> Option<&TradeSample> {
        match self {
            StreamMessage::Trade { data } => data.first(),
            _ => None,
        }
    }
}
