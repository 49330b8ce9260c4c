use std::fs;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod models;
mod services;
mod utils;

use api::coingecko::{CoinGeckoClient, FetchError};
use models::PricePoint;
use services::{chart_service, report_service};

/// Trailing window for the history chart, in days
const DEFAULT_CHART_DAYS: u32 = 7;
/// Where the rendered chart lands, relative to the working directory
const CHART_OUTPUT_PATH: &str = "bitcoin_chart.png";
const CHART_WIDTH: u32 = 1200;
const CHART_HEIGHT: u32 = 600;

/// How far one fetch-and-present cycle got before stopping
#[derive(Debug)]
enum RunOutcome {
    /// Quote fetch failed; no report was printed and no history fetched
    QuoteFailed(FetchError),
    /// Report printed, then the history fetch failed; nothing to chart
    HistoryFailed(FetchError),
    /// Report printed and the series fetched
    Fetched(Vec<PricePoint>),
}

/// Fetch and print the current quote, then fetch the history series.
///
/// Prints the report and the progress line as each stage completes, but
/// leaves error presentation and the chart to the caller, which matches on
/// the returned outcome.
async fn run(client: &CoinGeckoClient, days: u32) -> RunOutcome {
    // Current snapshot first; nothing else runs without it
    let snapshot = match client.fetch_quote().await {
        Ok(snapshot) => snapshot,
        Err(e) => return RunOutcome::QuoteFailed(e),
    };

    println!("{}", report_service::format_report(&snapshot));

    println!("\nGenerating price history plot...");
    match client.fetch_history(days).await {
        Ok(points) => RunOutcome::Fetched(points),
        Err(e) => RunOutcome::HistoryFailed(e),
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("btcwatch=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("₿ btcwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let api_key = std::env::var("COINGECKO_API_KEY").ok();
    if api_key.is_some() {
        debug!("Using CoinGecko demo API key from environment");
    }
    let client = CoinGeckoClient::new(api_key);

    let history = match run(&client, DEFAULT_CHART_DAYS).await {
        RunOutcome::QuoteFailed(e) => {
            error!("Quote fetch failed: {}", e);
            println!("Error fetching Bitcoin price: {}", e);
            return;
        }
        RunOutcome::HistoryFailed(e) => {
            error!("History fetch failed: {}", e);
            println!("Error fetching historical prices: {}", e);
            return;
        }
        RunOutcome::Fetched(points) => points,
    };

    match chart_service::render_chart(&history, DEFAULT_CHART_DAYS, CHART_WIDTH, CHART_HEIGHT) {
        Ok(image_data) if image_data.is_empty() => {
            debug!("No history points to draw, chart skipped");
        }
        Ok(image_data) => match fs::write(CHART_OUTPUT_PATH, &image_data) {
            Ok(()) => info!(
                "Chart written to {} ({} bytes)",
                CHART_OUTPUT_PATH,
                image_data.len()
            ),
            Err(e) => error!("Failed to write chart file: {}", e),
        },
        Err(e) => {
            error!("Chart rendering failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const QUOTE_BODY: &str = r#"{"bitcoin":{"usd":67890.5,"usd_market_cap":1342000000000.0,"usd_24h_vol":35120000000.0,"usd_24h_change":-3.4,"nok":720123.25,"nok_market_cap":14230000000000.0,"nok_24h_vol":372000000000.0,"nok_24h_change":-3.1}}"#;

    /// Minimal provider double: answers the quote endpoint (when `quote_ok`)
    /// with a canned body, fails everything else with a 500, and counts the
    /// requests it serves.
    async fn spawn_stub_provider(quote_ok: bool, hits: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let hits = hits.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    hits.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = if quote_ok && request.contains("/simple/price") {
                        ("HTTP/1.1 200 OK", QUOTE_BODY)
                    } else {
                        ("HTTP/1.1 500 Internal Server Error", "upstream down")
                    };
                    let response = format!(
                        "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        base_url
    }

    #[tokio::test]
    async fn test_run_stops_after_quote_failure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_stub_provider(false, hits.clone()).await;
        let client = CoinGeckoClient::with_base_url(None, base_url);

        let outcome = run(&client, 7).await;

        assert!(matches!(
            outcome,
            RunOutcome::QuoteFailed(FetchError::Server(500, _))
        ));
        // The history endpoint must never have been hit
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_keeps_report_when_history_fails() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_stub_provider(true, hits.clone()).await;
        let client = CoinGeckoClient::with_base_url(None, base_url);

        let outcome = run(&client, 7).await;

        // Quote leg succeeded (and printed), only the history leg failed
        assert!(matches!(
            outcome,
            RunOutcome::HistoryFailed(FetchError::Server(500, _))
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
