//! Ticker symbol tracked by the watcher.
//!
//! A symbol is free-form user text. The only rule is that it must not be
//! empty once surrounding whitespace is removed; no case folding is applied.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// A non-blank ticker identifier such as `AAPL` or `BINANCE:BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parses user input, returning `None` for empty or blank text.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Symbol(trimmed.to_string()))
        }
    }

    /// Borrow the symbol text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::parse(s).ok_or_else(|| QuoteError::InvalidSymbol(s.to_string()))
    }
}

impl TryFrom<String> for Symbol {
    type Error = QuoteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("AAPL", "AAPL" ; "plain")]
    #[test_case("  msft \n", "msft" ; "trimmed and case preserved")]
    #[test_case("BINANCE:BTCUSDT", "BINANCE:BTCUSDT" ; "exchange prefixed")]
    fn parses_non_blank_input(raw: &str, expected: &str) {
        let symbol = Symbol::parse(raw).expect("symbol");
        assert_eq!(symbol.as_str(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "spaces")]
    #[test_case("\t\n" ; "control whitespace")]
    fn rejects_blank_input(raw: &str) {
        assert!(Symbol::parse(raw).is_none());
        assert!(matches!(raw.parse::<Symbol>(), Err(QuoteError::InvalidSymbol(_))));
    }

    #[test]
    fn deserializing_blank_symbol_fails() {
        assert!(serde_json::from_str::<Symbol>("\"  \"").is_err());
        let symbol: Symbol = serde_json::from_str("\"TSLA\"").unwrap();
        assert_eq!(symbol.to_string(), "TSLA");
    }
}
