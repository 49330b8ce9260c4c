use crate::models::PriceSnapshot;
use crate::utils::{format_nok, format_pct, format_usd};

/// Shape the snapshot into the fixed text report.
///
/// Field order is part of the output contract: a timestamp header, the USD
/// block, then the NOK block. The returned string has no trailing newline;
/// the caller owns that.
pub fn format_report(snapshot: &PriceSnapshot) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "Bitcoin Price Information - {}\n\n",
        snapshot.observed_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str("USD Information:\n");
    report.push_str(&format!(
        "Current Price: {}\n",
        format_usd(snapshot.price_usd)
    ));
    report.push_str(&format!(
        "24h Change: {}\n",
        format_pct(snapshot.change_24h_usd_pct)
    ));
    report.push_str(&format!(
        "Market Cap: {}\n\n",
        format_usd(snapshot.market_cap_usd)
    ));
    report.push_str("NOK Information:\n");
    report.push_str(&format!(
        "Current Price: {}\n",
        format_nok(snapshot.price_nok)
    ));
    report.push_str(&format!(
        "24h Change: {}\n",
        format_pct(snapshot.change_24h_nok_pct)
    ));
    report.push_str(&format!(
        "Market Cap: {}",
        format_nok(snapshot.market_cap_nok)
    ));
    report
}
