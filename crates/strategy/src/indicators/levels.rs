//! Pivot-based support and resistance.
//!
//! A bar is a pivot low when its low is strictly below every other low within
//! `period` bars on either side; otherwise it is a pivot high when its high is
//! strictly above every other high in that span.

use common::{Candle, SrPosition};

#[derive(Debug, Clone)]
pub struct SupportResistance {
    /// Pivot radius in bars.
    pub period: usize,
    /// Proximity band as a fraction of price (0.003 = 0.3%).
    pub tolerance: f64,
}

/// Nearest levels around a price and the resulting classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub support: f64,
    pub resistance: f64,
    pub position: SrPosition,
}

impl SupportResistance {
    pub fn new(period: usize, tolerance: f64) -> Self {
        assert!(period >= 1, "pivot period must be >= 1");
        Self { period, tolerance }
    }

    /// Pivot lows (supports) and pivot highs (resistances), in window order.
    pub fn pivots(&self, candles: &[Candle]) -> (Vec<f64>, Vec<f64>) {
        let p = self.period;
        let mut supports = Vec::new();
        let mut resistances = Vec::new();
        if candles.len() < 2 * p + 1 {
            return (supports, resistances);
        }

        for i in p..candles.len() - p {
            let span = (i - p)..=(i + p);
            let low = candles[i].low;
            let high = candles[i].high;

            let is_pivot_low = span.clone().all(|j| j == i || candles[j].low > low);
            if is_pivot_low {
                supports.push(low);
                continue;
            }
            let is_pivot_high = span.into_iter().all(|j| j == i || candles[j].high < high);
            if is_pivot_high {
                resistances.push(high);
            }
        }
        (supports, resistances)
    }

    /// Greatest pivot low below `price` and least pivot high above it.
    /// Either falls back to `price` itself when no such pivot exists.
    pub fn nearest(&self, price: f64, candles: &[Candle]) -> (f64, f64) {
        let (supports, resistances) = self.pivots(candles);
        let support = supports
            .into_iter()
            .filter(|&s| s < price)
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
            .unwrap_or(price);
        let resistance = resistances
            .into_iter()
            .filter(|&r| r > price)
            .fold(None, |best: Option<f64>, r| Some(best.map_or(r, |b| b.min(r))))
            .unwrap_or(price);
        (support, resistance)
    }

    pub fn classify(&self, price: f64, candles: &[Candle]) -> Levels {
        let (support, resistance) = self.nearest(price, candles);
        let band = price * self.tolerance;

        let position = if (price - support).abs() <= band {
            SrPosition::NearSupport
        } else if (price - resistance).abs() <= band {
            SrPosition::NearResistance
        } else {
            SrPosition::AwayFromLevels
        };

        Levels {
            support,
            resistance,
            position,
        }
    }
}

impl Default for SupportResistance {
    fn default() -> Self {
        Self::new(10, 0.003)
    }
}
