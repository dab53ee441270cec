//! Point-in-time quote returned by the REST quote endpoint.
//!
//! The endpoint answers with short single-letter field names. Only the current
//! price `c` drives the view; the other fields are kept for completeness.
use serde::{Deserialize, Serialize};

/// Quote snapshot for a single symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Current price.
    #[serde(rename = "c", default)]
    pub current: Option<f64>,
    /// High price of the day.
    #[serde(rename = "h", default)]
    pub high: Option<f64>,
    /// Low price of the day.
    #[serde(rename = "l", default)]
    pub low: Option<f64>,
    /// Open price of the day.
    #[serde(rename = "o", default)]
    pub open: Option<f64>,
    /// Previous close price.
    #[serde(rename = "pc", default)]
    pub previous_close: Option<f64>,
    /// Absolute change since the previous close.
    #[serde(rename = "d", default)]
    pub change: Option<f64>,
    /// Percent change since the previous close.
    #[serde(rename = "dp", default)]
    pub percent_change: Option<f64>,
    /// Quote time, seconds since the UNIX epoch.
    #[serde(rename = "t", default)]
    pub timestamp: Option<i64>,
}

impl Quote {
    /// Current price, if the payload carries one that can be displayed.
    ///
    /// Unknown symbols come back as a well-formed object with `c` set to zero
    /// (or missing entirely), so zero and NaN are treated as "no price".
    pub fn usable_price(&self) -> Option<f64> {
        self.current.filter(|price| *price != 0.0 && !price.is_nan())
    }
}
