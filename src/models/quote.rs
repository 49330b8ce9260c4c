//! Current price snapshot models

use chrono::{DateTime, Local};

/// Point-in-time Bitcoin price and market data in USD and NOK.
///
/// Built fresh on every quote fetch and never persisted. `observed_at` is
/// the local wall-clock time the response was parsed, shown verbatim in the
/// report header.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub price_usd: f64,
    pub price_nok: f64,
    pub change_24h_usd_pct: f64,
    pub change_24h_nok_pct: f64,
    pub market_cap_usd: f64,
    pub market_cap_nok: f64,
    pub observed_at: DateTime<Local>,
}
