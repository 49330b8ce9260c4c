use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Per-currency quote fields for one asset from the simple-price endpoint.
///
/// The request always asks for 24h change, 24h volume and market cap, so
/// change and market cap are required fields; the volume pair is decoded but
/// not surfaced in the snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinQuote {
    pub usd: f64,
    pub nok: f64,
    pub usd_24h_change: f64,
    pub nok_24h_change: f64,
    pub usd_market_cap: f64,
    pub nok_market_cap: f64,
    pub usd_24h_vol: Option<f64>,
    pub nok_24h_vol: Option<f64>,
}

/// Response from the market-chart endpoint.
///
/// The body also carries `market_caps` and `total_volumes` arrays in the
/// same `[timestamp_ms, value]` layout; only `prices` is decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<(f64, f64)>,
}

/// Errors surfaced by the CoinGecko fetchers.
///
/// Status-code mapping lives in [`FetchError::from_status`] so tests can
/// assert on returned values rather than logged text.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Transport-level failure: timeout, DNS, connection refused
    #[error("Request error: {0}")]
    Request(String),
    /// HTTP 429; `retry_after` holds the Retry-After header in seconds
    #[error("Rate limited by provider{}", fmt_retry_after(.retry_after))]
    RateLimited { retry_after: Option<u64> },
    /// HTTP 5xx
    #[error("Server error ({0}): {1}")]
    Server(u16, String),
    /// Any other non-success status
    #[error("HTTP error ({0}): {1}")]
    Http(u16, String),
    /// Undecodable body, or a field outside its valid range
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Structurally valid body without the expected asset entry
    #[error("Missing '{0}' in provider response")]
    MissingField(&'static str),
}

impl FetchError {
    /// Map a non-success HTTP status and its body to an error variant.
    pub fn from_status(status: u16, body: String, retry_after: Option<u64>) -> Self {
        match status {
            429 => {
                warn!("Rate limited by provider, retry after {:?} s", retry_after);
                FetchError::RateLimited { retry_after }
            }
            500..=599 => {
                warn!("Provider server error {}: {}", status, body);
                FetchError::Server(status, extract_provider_message(body))
            }
            _ => FetchError::Http(status, extract_provider_message(body)),
        }
    }
}

fn fmt_retry_after(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(" (retry after {} s)", secs),
        None => String::new(),
    }
}

/// Pull the human-readable message out of CoinGecko's JSON error body
/// (`{"status": {"error_code": .., "error_message": ..}}`) when there is one,
/// otherwise pass the raw body through.
fn extract_provider_message(body: String) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(message) = value
            .get("status")
            .and_then(|status| status.get("error_message"))
            .and_then(|message| message.as_str())
        {
            return message.to_string();
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_decode_simple_price_response() {
        let body = r#"{
            "bitcoin": {
                "usd": 67890.5,
                "usd_market_cap": 1342000000000.0,
                "usd_24h_vol": 35120000000.0,
                "usd_24h_change": -3.4,
                "nok": 720123.25,
                "nok_market_cap": 14230000000000.0,
                "nok_24h_vol": 372000000000.0,
                "nok_24h_change": -3.1
            }
        }"#;
        let decoded: HashMap<String, CoinQuote> = serde_json::from_str(body).unwrap();
        let quote = &decoded["bitcoin"];
        assert_eq!(quote.usd, 67890.5);
        assert_eq!(quote.nok, 720123.25);
        assert_eq!(quote.usd_24h_change, -3.4);
        assert_eq!(quote.nok_24h_change, -3.1);
        assert_eq!(quote.usd_market_cap, 1_342_000_000_000.0);
        assert_eq!(quote.usd_24h_vol, Some(35_120_000_000.0));
    }

    #[test]
    fn test_decode_simple_price_rejects_missing_change_fields() {
        let body = r#"{"bitcoin": {"usd": 67890.5, "nok": 720123.25}}"#;
        let decoded: Result<HashMap<String, CoinQuote>, _> = serde_json::from_str(body);
        assert!(decoded.is_err());
    }

    #[test]
    fn test_decode_market_chart_response() {
        let body = r#"{
            "prices": [[1711843200000, 69702.3], [1711929600000, 70587.9]],
            "market_caps": [[1711843200000, 1371210000000.0]],
            "total_volumes": [[1711843200000, 28994000000.0]]
        }"#;
        let decoded: MarketChartResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.prices.len(), 2);
        assert_eq!(decoded.prices[0], (1_711_843_200_000.0, 69702.3));
        assert_eq!(decoded.prices[1], (1_711_929_600_000.0, 70587.9));
    }

    #[test]
    fn test_from_status_maps_rate_limit() {
        let err = FetchError::from_status(429, String::new(), Some(37));
        assert!(matches!(
            err,
            FetchError::RateLimited {
                retry_after: Some(37)
            }
        ));
    }

    #[test]
    fn test_from_status_maps_server_error() {
        let err = FetchError::from_status(503, "upstream down".to_string(), None);
        assert!(matches!(err, FetchError::Server(503, _)));
    }

    #[test]
    fn test_from_status_extracts_provider_message() {
        let body = r#"{"status":{"error_code":10005,"error_message":"Missing parameter vs_currencies"}}"#;
        let err = FetchError::from_status(400, body.to_string(), None);
        match err {
            FetchError::Http(400, message) => {
                assert_eq!(message, "Missing parameter vs_currencies")
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_rate_limited_display() {
        let with_hint = FetchError::RateLimited {
            retry_after: Some(37),
        };
        assert_eq!(
            with_hint.to_string(),
            "Rate limited by provider (retry after 37 s)"
        );
        let without_hint = FetchError::RateLimited { retry_after: None };
        assert_eq!(without_hint.to_string(), "Rate limited by provider");
    }
}
