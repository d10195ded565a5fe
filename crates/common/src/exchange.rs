use async_trait::async_trait;

use crate::{Alert, Candle, Result};

/// Abstraction over the price feed.
///
/// `BinanceKlines` implements this for the live loop and the backtest binary.
/// Implementations own their retry policy; the analyzer only ever sees the
/// returned, time-ordered candles.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the most recent `limit` candles for `symbol` on `interval`
    /// (e.g. "15m"), oldest first.
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize)
        -> Result<Vec<Candle>>;
}

/// Destination for operator-facing alerts (Telegram in production).
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<()>;
}
