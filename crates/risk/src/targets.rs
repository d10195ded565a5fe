use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::TradeSide;

/// User-configurable risk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Stop-loss distance in ATRs.
    pub atr_multiplier_sl: f64,
    /// Take-profit distance in ATRs.
    pub atr_multiplier_tp: f64,
    /// Favourable move, as a fraction of entry, that moves the stop to entry
    /// (e.g. 0.01 = 1%).
    pub breakeven_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            atr_multiplier_sl: 2.0,
            atr_multiplier_tp: 3.0,
            breakeven_threshold: 0.01,
        }
    }
}

/// Exit levels for a new position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub stop_loss: f64,
    pub take_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakevenStatus {
    /// Stop moved to the entry price.
    Activated,
    /// Threshold not reached; stop unchanged.
    NotReached,
    /// Entry or current price was not positive; stop unchanged.
    InvalidPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakevenUpdate {
    pub stop_loss: f64,
    pub status: BreakevenStatus,
}

impl RiskConfig {
    /// ATR-based stop-loss and take-profit around `entry`.
    ///
    /// With `atr == 0` both levels collapse onto the entry; callers must not
    /// open a position in that case.
    pub fn targets(&self, entry: f64, atr: f64, side: TradeSide) -> Targets {
        let sl_dist = self.atr_multiplier_sl * atr;
        let tp_dist = self.atr_multiplier_tp * atr;
        let targets = match side {
            TradeSide::Buy => Targets {
                stop_loss: entry - sl_dist,
                take_profit: entry + tp_dist,
            },
            TradeSide::Sell => Targets {
                stop_loss: entry + sl_dist,
                take_profit: entry - tp_dist,
            },
        };
        debug!(%side, entry, atr, sl = targets.stop_loss, tp = targets.take_profit, "Targets computed");
        targets
    }

    /// Move the stop to entry once price has moved `breakeven_threshold` away
    /// from it.
    ///
    /// The distance is measured in either direction, so callers should only
    /// ask once the move is known to be in the trade's favour.
    pub fn breakeven(&self, entry: f64, current: f64, initial_sl: f64) -> BreakevenUpdate {
        if entry <= 0.0 || current <= 0.0 {
            warn!(entry, current, "Breakeven check with invalid price");
            return BreakevenUpdate {
                stop_loss: initial_sl,
                status: BreakevenStatus::InvalidPrice,
            };
        }

        let moved = (current - entry).abs() / entry;
        if moved >= self.breakeven_threshold {
            BreakevenUpdate {
                stop_loss: entry,
                status: BreakevenStatus::Activated,
            }
        } else {
            BreakevenUpdate {
                stop_loss: initial_sl,
                status: BreakevenStatus::NotReached,
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_targets_bracket_entry() {
        let risk = RiskConfig::default();
        let t = risk.targets(100.0, 1.0, TradeSide::Buy);
        assert_eq!(t.stop_loss, 98.0);
        assert_eq!(t.take_profit, 103.0);
    }

    #[test]
    fn sell_targets_are_mirrored() {
        let risk = RiskConfig::default();
        let t = risk.targets(100.0, 1.0, TradeSide::Sell);
        assert_eq!(t.stop_loss, 102.0);
        assert_eq!(t.take_profit, 97.0);
    }

    #[test]
    fn zero_atr_collapses_onto_entry() {
        let risk = RiskConfig::default();
        let t = risk.targets(100.0, 0.0, TradeSide::Buy);
        assert_eq!(t.stop_loss, 100.0);
        assert_eq!(t.take_profit, 100.0);
    }

    #[test]
    fn custom_multipliers() {
        let risk = RiskConfig {
            atr_multiplier_sl: 1.0,
            atr_multiplier_tp: 3.0,
            ..RiskConfig::default()
        };
        let t = risk.targets(100.0, 2.0, TradeSide::Buy);
        assert_eq!(t.stop_loss, 98.0);
        assert_eq!(t.take_profit, 106.0);
    }

    #[test]
    fn breakeven_activates_at_threshold() {
        let risk = RiskConfig::default();
        let update = risk.breakeven(100.0, 101.0, 98.0);
        assert_eq!(update.status, BreakevenStatus::Activated);
        assert_eq!(update.stop_loss, 100.0);
    }

    #[test]
    fn breakeven_not_reached_keeps_stop() {
        let risk = RiskConfig::default();
        let update = risk.breakeven(100.0, 100.5, 98.0);
        assert_eq!(update.status, BreakevenStatus::NotReached);
        assert_eq!(update.stop_loss, 98.0);
    }

    #[test]
    fn breakeven_rejects_invalid_prices() {
        let risk = RiskConfig::default();
        for (entry, current) in [(0.0, 100.0), (100.0, 0.0), (-1.0, 100.0), (100.0, -5.0)] {
            let update = risk.breakeven(entry, current, 98.0);
            assert_eq!(update.status, BreakevenStatus::InvalidPrice);
            assert_eq!(update.stop_loss, 98.0);
        }
    }
}
