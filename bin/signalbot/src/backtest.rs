use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use backtest::Simulator;
use common::{CandleSource, Config};
use engine::BinanceKlines;
use strategy::StrategyFileConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env();
    let strategy_file = StrategyFileConfig::load_or_default(&cfg.strategy_config_path)
        .context("loading strategy config")?;
    info!(pair = %cfg.symbol, interval = %cfg.interval, limit = cfg.backtest_limit, "Backtest starting");

    let source = BinanceKlines::new().context("building Binance client")?;
    let candles = source
        .fetch_candles(&cfg.symbol, &cfg.interval, cfg.backtest_limit)
        .await
        .with_context(|| format!("fetching {} {} candles", cfg.symbol, cfg.interval))?;
    if candles.is_empty() {
        bail!("no candles returned for {} {}", cfg.symbol, cfg.interval);
    }
    let higher = match source
        .fetch_candles(&cfg.symbol, &cfg.higher_interval, cfg.backtest_limit)
        .await
    {
        Ok(higher) => higher,
        Err(e) => {
            warn!(interval = %cfg.higher_interval, error = %e, "Higher timeframe unavailable, using fallback filter");
            Vec::new()
        }
    };
    info!(
        candles = candles.len(),
        interval = %cfg.interval,
        higher = higher.len(),
        higher_interval = %cfg.higher_interval,
        "History fetched"
    );

    let simulator = Simulator::from_config(&strategy_file);
    let report = simulator.run(&candles, &higher);
    report.log_summary();

    if report.stats.total_signals == 0 {
        // Show why nothing traded by analyzing the most recent window.
        let analyzer = simulator.analyzer();
        let analysis =
            analyzer.analyze(&candles, (!higher.is_empty()).then_some(higher.as_slice()));
        let snap = &analysis.snapshot;
        info!(
            adx_threshold = analyzer.config().adx_threshold,
            min_confidence = analyzer.config().min_confidence,
            trend = %analysis.trend,
            confidence = analysis.confidence,
            rsi = ?snap.rsi,
            adx = ?snap.adx,
            note = ?snap.note,
            trend_filter = ?snap.trend_filter,
            sr = ?snap.sr_position,
            ngtcv = ?snap.ngtcv,
            "No trades opened; latest analysis"
        );
    }
    Ok(())
}
