/// RSI (Relative Strength Index) indicator.
///
/// Averages the last `period` gains and losses with a simple mean (no Wilder
/// smoothing), so the value only depends on the most recent `period` changes.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl RsiIndicator {
    /// Neutral value returned while there is not enough history.
    pub const NEUTRAL: f64 = 50.0;

    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period, overbought, oversold }
    }

    /// Compute RSI from a slice of close prices (oldest first).
    /// Returns 50.0 if there are fewer than `period + 1` values.
    pub fn compute(&self, closes: &[f64]) -> f64 {
        if closes.len() < self.period + 1 {
            return Self::NEUTRAL;
        }

        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let recent = &changes[changes.len() - self.period..];

        let avg_gain = recent.iter().filter(|&&c| c > 0.0).sum::<f64>() / self.period as f64;
        let avg_loss =
            recent.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>() / self.period as f64;

        if avg_loss == 0.0 {
            return 100.0;
        }

        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }

    pub fn is_overbought(&self, rsi: f64) -> bool {
        rsi > self.overbought
    }

    pub fn is_oversold(&self, rsi: f64) -> bool {
        rsi < self.oversold
    }
}

impl Default for RsiIndicator {
    fn default() -> Self {
        Self::new(14, 70.0, 30.0)
    }
}
