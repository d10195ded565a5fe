use serde::Serialize;
use tracing::{debug, info, warn};

use common::{Analysis, Candle, Direction, ExitReason, Stats, Trade, TradeContext, TradeSide};
use risk::{BreakevenStatus, RiskConfig};
use strategy::{generate_signal, BacktestSettings, MarketAnalyzer, StrategyFileConfig};

use crate::report::BacktestReport;

/// RSI levels that make a HOLD worth a debug line when the trend filter agrees.
const NEAR_SIGNAL_RSI_LOW: f64 = 35.0;
const NEAR_SIGNAL_RSI_HIGH: f64 = 65.0;

/// At most one position exists at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum Position {
    #[default]
    Flat,
    Open(Trade),
}

/// Everything the replay carries from one candle to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationState {
    pub position: Position,
    pub stats: Stats,
    /// Closed trades, oldest first.
    pub trades: Vec<Trade>,
}

/// Replays a candle history through the analyzer, opening one ATR-bracketed
/// trade at a time.
#[derive(Debug, Clone)]
pub struct Simulator {
    analyzer: MarketAnalyzer,
    risk: RiskConfig,
    settings: BacktestSettings,
}

impl Simulator {
    pub fn new(analyzer: MarketAnalyzer, risk: RiskConfig, settings: BacktestSettings) -> Self {
        Self {
            analyzer,
            risk,
            settings,
        }
    }

    pub fn from_config(config: &StrategyFileConfig) -> Self {
        Self::new(
            MarketAnalyzer::new(config.analyzer.clone()),
            config.risk.clone(),
            config.backtest.clone(),
        )
    }

    pub fn analyzer(&self) -> &MarketAnalyzer {
        &self.analyzer
    }

    /// Replay `candles` from the warmup index to the end.
    ///
    /// `higher_tf` is the higher-timeframe history, oldest first; it may be
    /// empty. Both sequences must be ordered by time.
    pub fn run(&self, candles: &[Candle], higher_tf: &[Candle]) -> BacktestReport {
        info!(
            candles = candles.len(),
            higher_tf = higher_tf.len(),
            warmup = self.settings.warmup,
            "Backtest started"
        );
        let state = (self.settings.warmup..candles.len()).fold(
            SimulationState::default(),
            |state, i| self.step(state, candles, higher_tf, i),
        );
        BacktestReport::from_state(state)
    }

    /// Advance the simulation by the candle at index `i`.
    pub fn step(
        &self,
        mut state: SimulationState,
        candles: &[Candle],
        higher_tf: &[Candle],
        i: usize,
    ) -> SimulationState {
        let candle = &candles[i];

        match std::mem::take(&mut state.position) {
            Position::Open(trade) => {
                state.position = match check_exit(&trade, candle) {
                    Some((exit_price, reason)) => {
                        let closed = trade.close(exit_price, candle.close_time, reason);
                        info!(
                            side = %closed.side,
                            entry = closed.entry_price,
                            exit = exit_price,
                            reason = %reason,
                            pnl_pct = closed.pnl_pct.unwrap_or(0.0),
                            "Trade closed"
                        );
                        state.stats.record_closed(&closed);
                        state.trades.push(closed);
                        Position::Flat
                    }
                    None if self.settings.use_breakeven => {
                        Position::Open(self.apply_breakeven(trade, candle))
                    }
                    None => Position::Open(trade),
                };
            }
            Position::Flat => {
                let visible = visible_higher_tf(higher_tf, candle.close_time);
                let analysis = self.analyzer.analyze(&candles[..=i], visible);
                if let Some(trade) = self.try_open(&analysis, candle) {
                    state.stats.total_signals += 1;
                    state.position = Position::Open(trade);
                } else {
                    log_near_signal(i, &analysis);
                }
            }
        }

        state
    }

    /// Open a trade at the close of `candle` if the analysis yields a BUY or
    /// SELL. Returns `None` for a HOLD or when ATR is zero or missing.
    pub fn try_open(&self, analysis: &Analysis, candle: &Candle) -> Option<Trade> {
        let signal = generate_signal(analysis);
        let side = signal.action.side()?;

        let atr = analysis.snapshot.atr.unwrap_or(0.0);
        if atr <= 0.0 {
            warn!(time = candle.close_time, %side, "ATR is zero, skipping trade");
            return None;
        }

        let entry = candle.close;
        let targets = self.risk.targets(entry, atr, side);
        let mut trade = Trade::open(
            side,
            entry,
            targets.stop_loss,
            targets.take_profit,
            candle.close_time,
        );
        trade.confidence = signal.confidence;
        trade.context = TradeContext::from(&analysis.snapshot);

        info!(
            %side,
            entry,
            sl = trade.stop_loss,
            tp = trade.take_profit,
            confidence = signal.confidence,
            "Trade opened"
        );
        Some(trade)
    }

    fn apply_breakeven(&self, mut trade: Trade, candle: &Candle) -> Trade {
        let in_profit = match trade.side {
            TradeSide::Buy => candle.close > trade.entry_price,
            TradeSide::Sell => candle.close < trade.entry_price,
        };
        if !in_profit || trade.stop_loss == trade.entry_price {
            return trade;
        }

        let update = self
            .risk
            .breakeven(trade.entry_price, candle.close, trade.stop_loss);
        if update.status == BreakevenStatus::Activated {
            debug!(
                side = %trade.side,
                entry = trade.entry_price,
                old_sl = trade.stop_loss,
                "Stop moved to breakeven"
            );
            trade.stop_loss = update.stop_loss;
        }
        trade
    }
}

/// Exit level hit by `candle`, if any. The stop-loss is tested first, so a
/// candle that spans both levels is a loss.
pub fn check_exit(trade: &Trade, candle: &Candle) -> Option<(f64, ExitReason)> {
    match trade.side {
        TradeSide::Buy => {
            if candle.low <= trade.stop_loss {
                Some((trade.stop_loss, ExitReason::StopLoss))
            } else if candle.high >= trade.take_profit {
                Some((trade.take_profit, ExitReason::TakeProfit))
            } else {
                None
            }
        }
        TradeSide::Sell => {
            if candle.high >= trade.stop_loss {
                Some((trade.stop_loss, ExitReason::StopLoss))
            } else if candle.low <= trade.take_profit {
                Some((trade.take_profit, ExitReason::TakeProfit))
            } else {
                None
            }
        }
    }
}

/// Higher-timeframe candles that had closed by `close_time`.
fn visible_higher_tf(higher_tf: &[Candle], close_time: i64) -> Option<&[Candle]> {
    if higher_tf.is_empty() {
        return None;
    }
    let end = higher_tf.partition_point(|c| c.close_time <= close_time);
    Some(&higher_tf[..end])
}

fn log_near_signal(index: usize, analysis: &Analysis) {
    let snap = &analysis.snapshot;
    let (Some(rsi), Some(filter)) = (snap.rsi, snap.trend_filter) else {
        return;
    };
    let near = match filter {
        Direction::Bullish => rsi < NEAR_SIGNAL_RSI_LOW,
        Direction::Bearish => rsi > NEAR_SIGNAL_RSI_HIGH,
    };
    if near {
        debug!(
            index,
            rsi,
            adx = snap.adx.unwrap_or(0.0),
            trend_filter = %filter,
            confidence = analysis.confidence,
            bullish_engulfing = snap.is_bullish_engulfing.unwrap_or(false),
            bearish_engulfing = snap.is_bearish_engulfing.unwrap_or(false),
            "Near signal"
        );
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
