use super::ema::{ema_series, EmaSeries};

/// MACD (Moving Average Convergence/Divergence) indicator.
///
/// Computes: MACD line = EMA(fast) − EMA(slow), Signal = EMA(macd_line, signal_period),
/// all series taken over the whole window and read at the last bar.
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// MACD values at the last bar of the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Macd {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

impl Macd {
    /// MACD line above its signal line.
    pub fn is_bullish(&self) -> bool {
        self.macd_line > self.signal_line
    }

    pub fn is_bearish(&self) -> bool {
        self.macd_line < self.signal_line
    }
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast < slow,
            "MACD fast period must be less than slow period"
        );
        Self { fast, slow, signal }
    }

    /// Compute MACD from a slice of close prices (oldest first).
    /// Returns all zeros if there are fewer than `slow` prices.
    pub fn compute(&self, closes: &[f64]) -> Macd {
        if closes.len() < self.slow {
            return Macd::default();
        }

        let macd_series = ema_series(closes, self.fast)
            .zip(ema_series(closes, self.slow))
            .map(|(fast, slow)| fast - slow);

        let mut macd_line = 0.0;
        let mut signal_line = 0.0;
        let mut points = 0usize;
        for (macd, signal) in MacdWithSignal::new(macd_series, self.signal) {
            macd_line = macd;
            signal_line = signal;
            points += 1;
        }

        // Not enough MACD points for a full signal-line EMA.
        if points < self.signal {
            return Macd {
                macd_line,
                signal_line: macd_line,
                histogram: 0.0,
            };
        }

        Macd {
            macd_line,
            signal_line,
            histogram: macd_line - signal_line,
        }
    }
}

impl Default for MacdIndicator {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

/// Pairs each MACD value with the signal-line EMA at the same point.
struct MacdWithSignal<I: Iterator<Item = f64> + Clone> {
    macd: I,
    signal: EmaSeries<I>,
}

impl<I: Iterator<Item = f64> + Clone> MacdWithSignal<I> {
    fn new(macd: I, signal_period: usize) -> Self {
        Self {
            signal: EmaSeries::new(macd.clone(), signal_period),
            macd,
        }
    }
}

impl<I: Iterator<Item = f64> + Clone> Iterator for MacdWithSignal<I> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<(f64, f64)> {
        Some((self.macd.next()?, self.signal.next()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::ema::ema;

    fn trending_up(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    fn trending_down(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - i as f64 * 0.5).collect()
    }

    #[test]
    fn macd_is_zero_with_insufficient_data() {
        let macd = MacdIndicator::default();
        assert_eq!(macd.compute(&[100.0, 102.0, 101.0]), Macd::default());
    }

    #[test]
    fn macd_line_matches_ema_difference() {
        let macd = MacdIndicator::default();
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let result = macd.compute(&prices);
        let expected = ema(&prices, 12) - ema(&prices, 26);
        assert!((result.macd_line - expected).abs() < 1e-9);
        assert!((result.histogram - (result.macd_line - result.signal_line)).abs() < 1e-12);
    }

    #[test]
    fn macd_bullish_on_steady_uptrend() {
        let macd = MacdIndicator::new(3, 6, 3);
        let result = macd.compute(&trending_up(40));
        assert!(result.macd_line > 0.0);
        assert!(result.is_bullish());
    }

    #[test]
    fn macd_bearish_on_steady_downtrend() {
        let macd = MacdIndicator::new(3, 6, 3);
        let result = macd.compute(&trending_down(40));
        assert!(result.macd_line < 0.0);
        assert!(result.is_bearish());
    }

    #[test]
    fn signal_defaults_to_macd_when_history_is_short() {
        // slow = 4 points are enough for MACD but not for a 9-period signal EMA.
        let macd = MacdIndicator::new(2, 4, 9);
        let result = macd.compute(&[1.0, 2.0, 4.0, 8.0]);
        assert_eq!(result.signal_line, result.macd_line);
        assert_eq!(result.histogram, 0.0);
    }

    #[test]
    fn flat_prices_give_zero_macd() {
        let macd = MacdIndicator::default();
        let result = macd.compute(&vec![100.0; 50]);
        assert!(result.macd_line.abs() < 1e-12);
        assert!(result.histogram.abs() < 1e-12);
    }
}
