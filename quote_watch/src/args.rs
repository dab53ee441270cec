//! Command-line arguments for Quote Watch.
//!
//! Every option can also come from the environment (or a `.env` file loaded at
//! startup). Values are read once; nothing is validated beyond parsing, so a
//! missing API key simply makes requests fail.
use std::time::Duration;

use clap::Parser;
use quote_common::net::{DEFAULT_QUOTE_URL, DEFAULT_STREAM_URL};

/// Parsed command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// API token sent with both the REST request and the stream connection.
    #[clap(long, env = "QUOTE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// REST endpoint returning a point-in-time quote.
    #[clap(long, env = "QUOTE_REST_URL", default_value = DEFAULT_QUOTE_URL)]
    pub quote_url: String,

    /// Streaming endpoint delivering live trades.
    #[clap(long, env = "QUOTE_STREAM_URL", default_value = DEFAULT_STREAM_URL)]
    pub stream_url: String,

    /// Symbol to start tracking immediately.
    #[clap(long)]
    pub symbol: Option<String>,

    /// Timeout for the REST quote request, in seconds.
    #[clap(long, default_value_t = 10)]
    pub http_timeout_secs: u64,
}

impl Args {
    /// REST request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Strip whitespace and matching quotes from string options.
    pub fn normalized(mut self) -> Self {
        self.api_key = normalize(&self.api_key);
        self.quote_url = normalize(&self.quote_url);
        self.stream_url = normalize(&self.stream_url);
        self
    }
}

/// Trim whitespace and one pair of surrounding double quotes.
fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}
