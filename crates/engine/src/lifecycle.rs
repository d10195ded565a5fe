use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use common::{Alert, AlertSink, CandleSource, Config, Error, Result};
use strategy::{evaluate_prediction, generate_signal, MarketAnalyzer};

use crate::state::BotState;

/// Pause after a failed cycle before trying again.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// Knobs of the live loop.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub symbol: String,
    pub interval: String,
    /// Fetched for the trend filter; `None` uses the same-timeframe fallback.
    pub higher_interval: Option<String>,
    pub candle_limit: usize,
    pub poll_period: Duration,
    pub error_backoff: Duration,
    /// Where state is persisted after every successful cycle.
    pub state_path: Option<PathBuf>,
}

impl LoopSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            symbol: cfg.symbol.clone(),
            interval: cfg.interval.clone(),
            higher_interval: Some(cfg.higher_interval.clone()),
            candle_limit: cfg.candle_limit,
            poll_period: cfg.poll_period(),
            error_backoff: ERROR_BACKOFF,
            state_path: Some(PathBuf::from(&cfg.state_path)),
        }
    }
}

/// Polls the candle source once per interval, judges the previous
/// prediction, and alerts on every new BUY/SELL.
pub struct SignalLoop {
    source: Arc<dyn CandleSource>,
    alerts: Arc<dyn AlertSink>,
    analyzer: MarketAnalyzer,
    settings: LoopSettings,
}

impl SignalLoop {
    pub fn new(
        source: Arc<dyn CandleSource>,
        alerts: Arc<dyn AlertSink>,
        analyzer: MarketAnalyzer,
        settings: LoopSettings,
    ) -> Self {
        Self {
            source,
            alerts,
            analyzer,
            settings,
        }
    }

    /// Run until Ctrl-C. Returns the final state.
    pub async fn run(&self, state: BotState) -> BotState {
        self.run_until(state, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run cycles until `shutdown` resolves. The shutdown future is checked
    /// between cycles.
    pub async fn run_until<F>(&self, mut state: BotState, shutdown: F) -> BotState
    where
        F: Future<Output = ()>,
    {
        let s = &self.settings;
        info!(pair = %s.symbol, interval = %s.interval, "Signal loop starting");
        self.notify(&Alert::Started {
            symbol: s.symbol.clone(),
            interval: s.interval.clone(),
        })
        .await;

        tokio::pin!(shutdown);
        loop {
            let wait = match self.tick(&state).await {
                Ok(next) => {
                    state = next;
                    self.persist(&state).await;
                    s.poll_period
                }
                Err(e) => {
                    error!(error = %e, backoff = ?s.error_backoff, "Cycle failed");
                    s.error_backoff
                }
            };

            info!(wait = ?wait, "Waiting for next candle");
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        self.notify(&Alert::Stopped).await;
        info!("Signal loop stopped");
        state
    }

    /// One cycle: fetch, judge the previous prediction, analyze, signal.
    /// `state` is left untouched on error.
    pub async fn tick(&self, state: &BotState) -> Result<BotState> {
        let s = &self.settings;
        let candles = self
            .source
            .fetch_candles(&s.symbol, &s.interval, s.candle_limit)
            .await?;
        let Some(current) = candles.last().cloned() else {
            return Err(Error::Feed(format!(
                "no candles returned for {} {}",
                s.symbol, s.interval
            )));
        };

        let mut next = state.clone();

        if let (Some(prev_signal), Some(prev_candle)) =
            (&state.previous_signal, &state.previous_candle)
        {
            // A restart within the same candle has nothing new to judge.
            if current.open_time > prev_candle.open_time {
                if let Some(outcome) = evaluate_prediction(prev_candle, &current, prev_signal) {
                    next.stats.record_prediction(outcome.correct, outcome.change_pct);
                    info!(
                        predicted = %prev_signal.action,
                        correct = outcome.correct,
                        change_pct = %format!("{:.2}", outcome.change_pct),
                        win_rate_pct = %format!("{:.1}", next.stats.win_rate() * 100.0),
                        "Prediction judged"
                    );
                    self.notify(&Alert::Accuracy {
                        stats: next.stats.clone(),
                    })
                    .await;
                }
            }
        }

        let higher = match &s.higher_interval {
            Some(interval) => match self
                .source
                .fetch_candles(&s.symbol, interval, s.candle_limit)
                .await
            {
                Ok(candles) => Some(candles),
                Err(e) => {
                    warn!(interval = %interval, error = %e, "Higher timeframe unavailable, using fallback filter");
                    None
                }
            },
            None => None,
        };

        let analysis = self.analyzer.analyze(&candles, higher.as_deref());
        info!(
            trend = %analysis.trend,
            confidence = %format!("{:.2}", analysis.confidence),
            rsi = analysis.snapshot.rsi.unwrap_or(0.0),
            price = current.close,
            "Market analyzed"
        );

        let signal = generate_signal(&analysis);
        if !signal.is_hold() {
            info!(action = %signal.action, confidence = signal.confidence, "Signal");
            self.notify(&Alert::Signal {
                symbol: s.symbol.clone(),
                interval: s.interval.clone(),
                signal,
                price: current.close,
                snapshot: analysis.snapshot,
            })
            .await;
        }

        next.previous_signal = Some(signal);
        next.previous_candle = Some(current);
        Ok(next)
    }

    async fn notify(&self, alert: &Alert) {
        if let Err(e) = self.alerts.deliver(alert).await {
            warn!(error = %e, "Alert delivery failed");
        }
    }

    async fn persist(&self, state: &BotState) {
        if let Some(path) = &self.settings.state_path {
            if let Err(e) = state.save(path).await {
                warn!(path = %path.display(), error = %e, "Failed to save bot state");
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
