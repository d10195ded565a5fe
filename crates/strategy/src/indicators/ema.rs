//! Exponential Moving Average.
//!
//! Recursive: EMA[t] = k * price[t] + (1 - k) * EMA[t-1], k = 2 / (period + 1).
//! Seed: EMA[0] = price[0].

/// Lazy EMA over any price iterator, yielding one smoothed value per input.
///
/// The series is finite (it ends with its input) and restartable: cloning it
/// before consumption, or building a new one over the same slice, replays
/// exactly the same values.
#[derive(Debug, Clone)]
pub struct EmaSeries<I> {
    prices: I,
    k: f64,
    current: Option<f64>,
}

impl<I: Iterator<Item = f64>> EmaSeries<I> {
    pub fn new(prices: I, period: usize) -> Self {
        Self {
            prices,
            k: 2.0 / (period as f64 + 1.0),
            current: None,
        }
    }
}

impl<I: Iterator<Item = f64>> Iterator for EmaSeries<I> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let price = self.prices.next()?;
        let value = match self.current {
            None => price,
            Some(prev) => price * self.k + prev * (1.0 - self.k),
        };
        self.current = Some(value);
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.prices.size_hint()
    }
}

/// Full EMA series over a price slice.
pub fn ema_series(
    prices: &[f64],
    period: usize,
) -> EmaSeries<std::iter::Copied<std::slice::Iter<'_, f64>>> {
    EmaSeries::new(prices.iter().copied(), period)
}

/// Final EMA value of `prices`.
///
/// With fewer than `period` prices the plain average of what is available is
/// returned instead (0.0 for an empty slice).
pub fn ema(prices: &[f64], period: usize) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    if prices.len() < period {
        return prices.iter().sum::<f64>() / prices.len() as f64;
    }
    ema_series(prices, period).last().unwrap_or(0.0)
}
