use std::collections::HashMap;

use chrono::{DateTime, Local};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client as HttpClient;
use tracing::debug;

use super::models::{CoinQuote, FetchError, MarketChartResponse};
use crate::models::{PricePoint, PriceSnapshot};

/// CoinGecko API client for the quote and market-chart endpoints
pub struct CoinGeckoClient {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.coingecko.com/api/v3";
    /// CoinGecko asset id for Bitcoin
    const COIN_ID: &'static str = "bitcoin";

    /// Create a new client against the public API. The demo API key is
    /// optional; without one the anonymous rate-limit tier applies.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Create a new client with a custom base URL (for testing)
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            api_key,
        }
    }

    /// Default headers; the demo API key header is attached when configured
    fn create_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| FetchError::Request(format!("Invalid API key header: {}", e)))?;
            headers.insert("x-cg-demo-api-key", value);
        }

        Ok(headers)
    }

    /// Seconds until the rate-limit window resets, when the provider sends
    /// a Retry-After header
    fn extract_retry_after(response: &reqwest::Response) -> Option<u64> {
        response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
    }

    /// Turn a non-success response into the matching error value
    async fn handle_error_response(response: reqwest::Response) -> FetchError {
        let status = response.status().as_u16();
        let retry_after = Self::extract_retry_after(&response);
        let body_text = response.text().await.unwrap_or_default();
        FetchError::from_status(status, body_text, retry_after)
    }

    /// GET /simple/price
    ///
    /// Retrieves the current Bitcoin price, 24h change, 24h volume and
    /// market cap in USD and NOK as a single snapshot. Does not retry and
    /// does not print; the caller decides how failures are shown.
    pub async fn fetch_quote(&self) -> Result<PriceSnapshot, FetchError> {
        let url = format!("{}/simple/price", self.base_url);
        let headers = self.create_headers()?;
        debug!("Fetching quote from {}", url);

        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .query(&[
                ("ids", Self::COIN_ID),
                ("vs_currencies", "usd,nok"),
                ("include_24hr_change", "true"),
                ("include_24hr_vol", "true"),
                ("include_market_cap", "true"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let mut quotes = response
            .json::<HashMap<String, CoinQuote>>()
            .await
            .map_err(|e| FetchError::Malformed(format!("Failed to parse response: {}", e)))?;

        let quote = quotes
            .remove(Self::COIN_ID)
            .ok_or(FetchError::MissingField(Self::COIN_ID))?;

        Ok(snapshot_from_quote(quote, Local::now()))
    }

    /// GET /coins/bitcoin/market_chart
    ///
    /// Retrieves the trailing `days`-day USD price series at daily
    /// granularity, preserving the provider's ordering. Same failure policy
    /// as [`Self::fetch_quote`]: no retry, no partial result.
    pub async fn fetch_history(&self, days: u32) -> Result<Vec<PricePoint>, FetchError> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, Self::COIN_ID);
        let headers = self.create_headers()?;
        debug!("Fetching {}d price history from {}", days, url);

        let days_param = days.to_string();
        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .query(&[
                ("vs_currency", "usd"),
                ("days", days_param.as_str()),
                ("interval", "daily"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let chart = response
            .json::<MarketChartResponse>()
            .await
            .map_err(|e| FetchError::Malformed(format!("Failed to parse response: {}", e)))?;

        let mut points = Vec::with_capacity(chart.prices.len());
        for (timestamp_ms, price) in chart.prices {
            let point = PricePoint::from_provider_ms(timestamp_ms, price).ok_or_else(|| {
                FetchError::Malformed(format!("Timestamp {} ms is out of range", timestamp_ms))
            })?;
            points.push(point);
        }
        debug!("Fetched {} history points", points.len());

        Ok(points)
    }
}

/// Shape the provider's per-currency quote into the domain snapshot
fn snapshot_from_quote(quote: CoinQuote, observed_at: DateTime<Local>) -> PriceSnapshot {
    PriceSnapshot {
        price_usd: quote.usd,
        price_nok: quote.nok,
        change_24h_usd_pct: quote.usd_24h_change,
        change_24h_nok_pct: quote.nok_24h_change,
        market_cap_usd: quote.usd_market_cap,
        market_cap_nok: quote.nok_market_cap,
        observed_at,
    }
}
