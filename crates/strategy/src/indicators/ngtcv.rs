//! ngtCV — momentum/volume composite for a single candle, in `[-1, 1]`.
//!
//! ```text
//! body_ratio    = |close - open| / (high - low)          (0 for a zero range)
//! direction     = +1 if close >= open else -1
//! wick_ratio    = (upper_shadow + lower_shadow) / (high - low)
//! volume_factor = volume / mean(last 20 historical volumes)
//! ngtcv = clip(body_ratio * direction * w_body
//!              - wick_ratio * |w_wick|
//!              + volume_factor * w_volume, -1, 1)
//! ```

use serde::{Deserialize, Serialize};

use common::Candle;

/// Reference volume used when there is no usable history.
pub const DEFAULT_REFERENCE_VOLUME: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NgtcvWeights {
    pub body: f64,
    /// Applied as a penalty regardless of sign.
    pub wick: f64,
    pub volume: f64,
}

impl Default for NgtcvWeights {
    fn default() -> Self {
        Self {
            body: 0.6,
            wick: -0.2,
            volume: 0.2,
        }
    }
}

/// The composite value together with the components it was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NgtcvBreakdown {
    pub value: f64,
    pub body_size: f64,
    pub wick_ratio: f64,
    pub volume_factor: f64,
}

#[derive(Debug, Clone)]
pub struct NgtcvIndicator {
    pub weights: NgtcvWeights,
    /// How many historical volumes form the reference average.
    pub volume_lookback: usize,
}

impl NgtcvIndicator {
    pub fn new(weights: NgtcvWeights, volume_lookback: usize) -> Self {
        Self {
            weights,
            volume_lookback: volume_lookback.max(1),
        }
    }

    pub fn compute(&self, candle: &Candle, historical_volumes: &[f64]) -> f64 {
        self.breakdown(candle, historical_volumes).value
    }

    pub fn breakdown(&self, candle: &Candle, historical_volumes: &[f64]) -> NgtcvBreakdown {
        let body_size = (candle.close - candle.open).abs();
        let direction = if candle.close >= candle.open { 1.0 } else { -1.0 };

        let upper_shadow = candle.high - candle.open.max(candle.close);
        let lower_shadow = candle.open.min(candle.close) - candle.low;
        let total_range = candle.high - candle.low;

        let (body_ratio, wick_ratio) = if total_range > 0.0 {
            (body_size / total_range, (upper_shadow + lower_shadow) / total_range)
        } else {
            (0.0, 0.0)
        };

        let volume_factor = if candle.volume == 0.0 {
            1.0
        } else {
            candle.volume / self.average_volume(historical_volumes)
        };

        let raw = body_ratio * direction * self.weights.body
            - wick_ratio * self.weights.wick.abs()
            + volume_factor * self.weights.volume;

        // inf * 0 from a degenerate volume reference
        let raw = if raw.is_nan() { 0.0 } else { raw };

        NgtcvBreakdown {
            value: raw.clamp(-1.0, 1.0),
            body_size,
            wick_ratio,
            volume_factor,
        }
    }

    /// Mean of the last `volume_lookback` volumes, or the default reference
    /// when there is no history or the mean is not positive.
    pub fn average_volume(&self, volumes: &[f64]) -> f64 {
        if volumes.is_empty() {
            return DEFAULT_REFERENCE_VOLUME;
        }
        let recent = &volumes[volumes.len().saturating_sub(self.volume_lookback)..];
        let avg = recent.iter().sum::<f64>() / recent.len() as f64;
        if avg > 0.0 && avg.is_finite() {
            avg
        } else {
            DEFAULT_REFERENCE_VOLUME
        }
    }

    /// Mean ngtCV over the last `count` candles of `window`, each measured
    /// against the volumes that precede it.
    pub fn recent_average(&self, window: &[Candle], count: usize) -> f64 {
        let count = count.min(window.len());
        if count == 0 {
            return 0.0;
        }
        let start = window.len() - count;
        let sum: f64 = (start..window.len())
            .map(|i| {
                let history: Vec<f64> = window[i.saturating_sub(self.volume_lookback)..i]
                    .iter()
                    .map(|c| c.volume)
                    .collect();
                self.compute(&window[i], &history)
            })
            .sum();
        sum / count as f64
    }
}

impl Default for NgtcvIndicator {
    fn default() -> Self {
        Self::new(NgtcvWeights::default(), 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle::from_ohlcv(0, 60_000, open, high, low, close, volume)
    }

    #[test]
    fn average_volume_of_history() {
        let ind = NgtcvIndicator::default();
        assert_eq!(ind.average_volume(&[1000.0, 1200.0, 800.0, 1100.0, 900.0]), 1000.0);
        assert_eq!(ind.average_volume(&[1000.0]), 1000.0);
        assert_eq!(ind.average_volume(&[]), DEFAULT_REFERENCE_VOLUME);
        assert_eq!(ind.average_volume(&[0.0, 0.0]), DEFAULT_REFERENCE_VOLUME);
    }

    #[test]
    fn average_volume_uses_last_twenty() {
        let ind = NgtcvIndicator::default();
        let mut volumes = vec![1_000_000.0; 5];
        volumes.extend(std::iter::repeat(10.0).take(20));
        assert_eq!(ind.average_volume(&volumes), 10.0);
    }

    #[test]
    fn bullish_marubozu_with_average_volume() {
        let ind = NgtcvIndicator::default();
        // Full body, no wicks, volume equal to the average.
        let b = ind.breakdown(&candle(100.0, 110.0, 100.0, 110.0, 1000.0), &[1000.0; 10]);
        assert!((b.value - 0.8).abs() < 1e-12, "got {}", b.value);
        assert_eq!(b.wick_ratio, 0.0);
        assert_eq!(b.volume_factor, 1.0);
        assert_eq!(b.body_size, 10.0);
    }

    #[test]
    fn bearish_candle_is_negative_with_light_volume() {
        let ind = NgtcvIndicator::default();
        let value = ind.compute(&candle(110.0, 110.0, 100.0, 100.0, 100.0), &[1000.0; 10]);
        // -0.6 + 0.1 * 0.2
        assert!((value + 0.58).abs() < 1e-12, "got {value}");
    }

    #[test]
    fn zero_range_candle_only_counts_volume() {
        let ind = NgtcvIndicator::default();
        let b = ind.breakdown(&candle(100.0, 100.0, 100.0, 100.0, 0.0), &[]);
        assert_eq!(b.wick_ratio, 0.0);
        assert_eq!(b.volume_factor, 1.0);
        assert!((b.value - 0.2).abs() < 1e-12);
    }

    #[test]
    fn huge_volume_is_clipped() {
        let ind = NgtcvIndicator::default();
        let value = ind.compute(&candle(100.0, 107.0, 99.0, 105.0, 1_000_000.0), &[10.0; 20]);
        assert_eq!(value, 1.0);
    }

    #[test]
    fn recent_average_of_identical_candles() {
        let ind = NgtcvIndicator::default();
        let window: Vec<Candle> = (0..10)
            .map(|_| candle(100.0, 110.0, 100.0, 110.0, 1000.0))
            .collect();
        assert!((ind.recent_average(&window, 3) - 0.8).abs() < 1e-12);
        assert_eq!(ind.recent_average(&[], 3), 0.0);
    }
}
