//! Default endpoints and URL helpers used by the watcher.

/// REST endpoint answering point-in-time quotes.
pub const DEFAULT_QUOTE_URL: &str = "https://finnhub.io/api/v1/quote";
/// Streaming endpoint delivering live trades.
pub const DEFAULT_STREAM_URL: &str = "wss://ws.finnhub.io";

/// Helper to build the streaming URL with the access token as a query parameter.
///
/// A bare `scheme://host` base gets a `/` path so the handshake request line
/// always carries a path.
pub fn stream_url(base: &str, token: &str) -> String {
    let mut url = base.to_string();
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let rest = &url[authority_start..];
    if !rest.contains('/') {
        let insert_at = rest.find('?').map(|i| authority_start + i).unwrap_or(url.len());
        url.insert(insert_at, '/');
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", url, separator, urlencoding::encode(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_encoded_token() {
        assert_eq!(stream_url("wss://ws.example", "abc"), "wss://ws.example/?token=abc");
        assert_eq!(stream_url("wss://ws.example?v=1", "abc"), "wss://ws.example/?v=1&token=abc");
        assert_eq!(stream_url("ws://127.0.0.1:9000/feed?v=2", "a b&c"), "ws://127.0.0.1:9000/feed?v=2&token=a%20b%26c");
    }

    #[test]
    fn empty_token_is_passed_through() {
        assert_eq!(stream_url(DEFAULT_STREAM_URL, ""), "wss://ws.finnhub.io/?token=");
    }
}
