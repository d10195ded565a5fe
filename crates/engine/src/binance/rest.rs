use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use common::{CandleSource, Candle, Error, Result};

const BASE_URL: &str = "https://api.binance.com";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Public kline (candlestick) endpoint of the Binance spot REST API.
/// No API key is needed.
pub struct BinanceKlines {
    http: Client,
    base_url: String,
    retry_delay: Duration,
}

impl BinanceKlines {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at another host (testnet, mirror, local stub).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            retry_delay: RETRY_DELAY,
        })
    }

    async fn fetch_once(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol), ("interval", interval), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Http(format!("HTTP {status}: {body}")));
        }

        parse_klines(&body)
    }
}

#[async_trait]
impl CandleSource for BinanceKlines {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(symbol, interval, limit).await {
                Ok(candles) => {
                    debug!(pair = %symbol, interval, count = candles.len(), "Klines fetched");
                    return Ok(candles);
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!(
                        pair = %symbol,
                        interval,
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        error = %e,
                        "Kline fetch failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ─── Response parsing ─────────────────────────────────────────────────────────

/// Parse a klines response: an array of rows
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trades, taker_base, taker_quote, ignore]` with prices as strings.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter().map(|row| parse_kline(row)).collect()
}

pub fn parse_kline(row: &[Value]) -> Result<Candle> {
    if row.len() < 11 {
        return Err(Error::Feed(format!(
            "kline row has {} fields, expected at least 11",
            row.len()
        )));
    }
    Ok(Candle {
        open_time: int_field(row, 0)?,
        open: float_field(row, 1)?,
        high: float_field(row, 2)?,
        low: float_field(row, 3)?,
        close: float_field(row, 4)?,
        volume: float_field(row, 5)?,
        close_time: int_field(row, 6)?,
        quote_asset_volume: float_field(row, 7)?,
        number_of_trades: count_field(row, 8)?,
        taker_buy_base_asset_volume: float_field(row, 9)?,
        taker_buy_quote_asset_volume: float_field(row, 10)?,
    })
}

fn int_field(row: &[Value], idx: usize) -> Result<i64> {
    row[idx]
        .as_i64()
        .ok_or_else(|| Error::Feed(format!("kline field {idx} is not an integer: {}", row[idx])))
}

fn count_field(row: &[Value], idx: usize) -> Result<u64> {
    row[idx]
        .as_u64()
        .ok_or_else(|| Error::Feed(format!("kline field {idx} is not a count: {}", row[idx])))
}

/// Binance sends decimals as strings; accept plain numbers too.
fn float_field(row: &[Value], idx: usize) -> Result<f64> {
    match &row[idx] {
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| Error::Feed(format!("kline field {idx} '{s}': {e}"))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Feed(format!("kline field {idx} out of range: {n}"))),
        other => Err(Error::Feed(format!("kline field {idx} is not numeric: {other}"))),
    }
}
