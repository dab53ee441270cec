//! Derived view state and the user-visible messages.
use crate::event::SnapshotOutcome;

/// Shown when the quote endpoint answered without a usable price.
pub const INVALID_SYMBOL_MESSAGE: &str = "Invalid stock symbol. Please try again.";
/// Shown when the quote request failed.
pub const FETCH_ERROR_MESSAGE: &str = "An error occurred. Please try again.";
/// Shown when the streaming connection failed.
pub const STREAM_ERROR_MESSAGE: &str = "WebSocket error occurred. Please try again later.";

/// What the shell renders.
///
/// `error` and `price` are independent: a trade tick never clears an error and
/// an error never clears the last price. Only starting a new fetch resets both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// A snapshot fetch is in flight.
    pub loading: bool,
    /// Last error message, if any.
    pub error: Option<String>,
    /// Last known price from either the snapshot or a trade.
    pub price: Option<f64>,
}

impl ViewState {
    /// A fetch started: clear the previous result and show progress.
    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
        self.price = None;
    }

    /// A fetch completed.
    pub fn apply_snapshot(&mut self, outcome: &SnapshotOutcome) {
        match outcome {
            SnapshotOutcome::Price(price) => self.price = Some(*price),
            SnapshotOutcome::InvalidSymbol => self.error = Some(INVALID_SYMBOL_MESSAGE.to_string()),
            SnapshotOutcome::Failed(_) => self.error = Some(FETCH_ERROR_MESSAGE.to_string()),
        }
        self.loading = false;
    }

    /// A trade arrived on the live stream.
    pub fn apply_trade(&mut self, price: f64) {
        self.price = Some(price);
    }

    /// The live stream failed.
    pub fn stream_failed(&mut self) {
        self.error = Some(STREAM_ERROR_MESSAGE.to_string());
    }

    /// Price line visibility: a price exists and no error is shown.
    pub fn visible_price(&self) -> Option<f64> {
        match self.error {
            Some(_) => None,
            None => self.price,
        }
    }
}
