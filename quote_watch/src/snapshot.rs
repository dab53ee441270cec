//! Point-in-time quote fetch over REST.
use std::time::Duration;

use log::warn;
use quote_common::{Quote, Symbol};
use reqwest::blocking::Client;

use crate::error::Result;
use crate::event::SnapshotOutcome;

/// Source of quote snapshots.
pub trait SnapshotSource: Send + Sync {
    /// Fetch the current quote for `symbol`.
    fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote>;
}

/// Fetch and classify in one step; any error becomes `SnapshotOutcome::Failed`.
pub fn fetch_outcome(source: &dyn SnapshotSource, symbol: &Symbol) -> SnapshotOutcome {
    match source.fetch_quote(symbol) {
        Ok(quote) => match quote.usable_price() {
            Some(price) => SnapshotOutcome::Price(price),
            None => SnapshotOutcome::InvalidSymbol,
        },
        Err(e) => {
            warn!("Quote request for {} failed: {}", symbol, e);
            SnapshotOutcome::Failed(e.to_string())
        }
    }
}

/// `GET <url>?symbol=<SYMBOL>&token=<TOKEN>` against a REST quote endpoint.
pub struct RestSnapshotSource {
    client: Client,
    url: String,
    token: String,
}

impl RestSnapshotSource {
    /// Build a source with a request timeout.
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(RestSnapshotSource {
            client,
            url: url.to_string(),
            token: token.to_string(),
        })
    }
}

impl SnapshotSource for RestSnapshotSource {
    fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
        let quote = self
            .client
            .get(&self.url)
            .query(&[("symbol", symbol.as_str()), ("token", self.token.as_str())])
            .send()?
            .error_for_status()?
            .json::<Quote>()?;
        Ok(quote)
    }
}
