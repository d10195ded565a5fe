use chrono::DateTime;
use serde::Serialize;
use tracing::info;

use common::{Stats, Trade};

use crate::simulator::{Position, SimulationState};

/// Outcome of a full replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub stats: Stats,
    /// Closed trades, oldest first.
    pub trades: Vec<Trade>,
    /// Position still open when the data ran out.
    pub open_trade: Option<Trade>,
    /// `correct / total_signals`, in `[0, 1]`.
    pub win_rate: f64,
}

impl BacktestReport {
    pub fn from_state(state: SimulationState) -> Self {
        let open_trade = match state.position {
            Position::Open(trade) => Some(trade),
            Position::Flat => None,
        };
        Self {
            win_rate: state.stats.win_rate(),
            stats: state.stats,
            trades: state.trades,
            open_trade,
        }
    }

    /// One line per closed trade followed by the totals.
    pub fn log_summary(&self) {
        info!(signals = self.stats.total_signals, "──── Backtest results ────");
        for trade in &self.trades {
            info!(
                entered = %format_time(trade.entry_time),
                side = %trade.side,
                entry = trade.entry_price,
                exit = trade.exit_price.unwrap_or(trade.entry_price),
                reason = %trade.exit_reason.map(|r| r.to_string()).unwrap_or_default(),
                result = %trade.result.map(|r| r.to_string()).unwrap_or_default(),
                pnl_pct = %format!("{:.2}", trade.pnl_pct.unwrap_or(0.0)),
                sr = ?trade.context.sr_position,
                trend_filter = ?trade.context.trend_filter,
                rsi = trade.context.rsi.unwrap_or(0.0),
                adx = trade.context.adx.unwrap_or(0.0),
                "Trade"
            );
        }
        if let Some(open) = &self.open_trade {
            info!(
                entered = %format_time(open.entry_time),
                side = %open.side,
                entry = open.entry_price,
                sl = open.stop_loss,
                tp = open.take_profit,
                "Still open at end of data"
            );
        }
        info!(
            correct = self.stats.correct,
            incorrect = self.stats.incorrect,
            win_rate_pct = %format!("{:.2}", self.win_rate * 100.0),
            total_pnl_pct = %format!("{:.2}", self.stats.total_pnl_pct),
            "Backtest summary"
        );
    }
}

fn format_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
