//! ATR — Average True Range.
//!
//! TR = max(high − low, |high − prev_close|, |low − prev_close|)
//! ATR = simple mean of the last `period` TR values.

use common::Candle;

/// True Range of `candle` given the previous candle's close.
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

#[derive(Debug, Clone)]
pub struct AtrIndicator {
    pub period: usize,
}

impl AtrIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }

    /// Returns 0.0 if there are fewer than `period + 1` candles.
    pub fn compute(&self, candles: &[Candle]) -> f64 {
        if candles.len() < self.period + 1 {
            return 0.0;
        }

        let ranges: Vec<f64> = candles
            .windows(2)
            .map(|w| true_range(w[1].high, w[1].low, w[0].close))
            .collect();
        let recent = &ranges[ranges.len() - self.period..];
        recent.iter().sum::<f64>() / self.period as f64
    }

    /// ATR as a percentage of the last close. 0.0 when the close is 0.
    pub fn compute_percent(&self, candles: &[Candle]) -> f64 {
        let Some(last) = candles.last() else {
            return 0.0;
        };
        if last.close == 0.0 {
            return 0.0;
        }
        self.compute(candles) / last.close * 100.0
    }
}

impl Default for AtrIndicator {
    fn default() -> Self {
        Self::new(14)
    }
}
