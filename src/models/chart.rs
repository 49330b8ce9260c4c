//! Price history models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single data point on the price history chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    /// Build a point from the provider's millisecond-epoch timestamp.
    ///
    /// Returns `None` when the timestamp falls outside chrono's
    /// representable range.
    pub fn from_provider_ms(timestamp_ms: f64, price: f64) -> Option<Self> {
        let timestamp = DateTime::from_timestamp_millis(timestamp_ms as i64)?;
        Some(PricePoint { timestamp, price })
    }
}
