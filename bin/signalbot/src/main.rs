use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{BinanceKlines, BotState, LoopSettings, SignalLoop};
use strategy::{MarketAnalyzer, StrategyFileConfig};
use telegram_alerts::TelegramNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(pair = %cfg.symbol, interval = %cfg.interval, higher = %cfg.higher_interval, "SignalBot starting");

    let (Some(token), Some(chat_id)) = (cfg.telegram_token.clone(), cfg.telegram_chat_id) else {
        bail!("TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must be set to run the live bot");
    };

    let strategy_file = StrategyFileConfig::load_or_default(&cfg.strategy_config_path)
        .context("loading strategy config")?;

    // ── Collaborators ─────────────────────────────────────────────────────────
    let source = Arc::new(BinanceKlines::new().context("building Binance client")?);
    let alerts = Arc::new(TelegramNotifier::new(token, chat_id));
    let analyzer = MarketAnalyzer::new(strategy_file.analyzer);

    let state = BotState::load(&cfg.state_path)
        .await
        .with_context(|| format!("loading bot state from '{}'", cfg.state_path))?;

    // ── Run ───────────────────────────────────────────────────────────────────
    let signal_loop = SignalLoop::new(source, alerts, analyzer, LoopSettings::from_config(&cfg));
    let state = signal_loop.run(state).await;

    state
        .save(&cfg.state_path)
        .await
        .with_context(|| format!("saving bot state to '{}'", cfg.state_path))?;
    info!(
        signals = state.stats.total_signals,
        correct = state.stats.correct,
        win_rate_pct = %format!("{:.1}", state.stats.win_rate() * 100.0),
        "SignalBot stopped"
    );
    Ok(())
}
