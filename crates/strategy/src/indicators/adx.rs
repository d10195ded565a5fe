//! ADX — Average Directional Index (Wilder).
//!
//! Steps:
//! 1. Compute TR, +DM and -DM from consecutive bars
//! 2. Smooth each with Wilder's running sum, seeded by the sum of the first `period` values
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), -DI likewise
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = mean of the last `period` DX values
//!
//! Needs `2 * period` bars: `period + 1` for the first DI, then `period - 1`
//! more for a full set of DX values.

use super::atr::true_range;

#[derive(Debug, Clone)]
pub struct AdxIndicator {
    pub period: usize,
}

impl AdxIndicator {
    /// Neutral value returned while there is not enough history.
    pub const NEUTRAL: f64 = 25.0;

    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period }
    }

    /// Compute ADX from parallel high/low/close slices (oldest first).
    pub fn compute(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> f64 {
        let n = highs.len().min(lows.len()).min(closes.len());
        if n < 2 * self.period {
            return Self::NEUTRAL;
        }

        let mut tr = Vec::with_capacity(n - 1);
        let mut plus_dm = Vec::with_capacity(n - 1);
        let mut minus_dm = Vec::with_capacity(n - 1);

        for i in 1..n {
            tr.push(true_range(highs[i], lows[i], closes[i - 1]));

            let up_move = highs[i] - highs[i - 1];
            let down_move = lows[i - 1] - lows[i];

            plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
            minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        }

        let smooth_tr = wilder_smooth(&tr, self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let dx: Vec<f64> = smooth_tr
            .iter()
            .zip(&smooth_plus)
            .zip(&smooth_minus)
            .map(|((&tr, &plus), &minus)| {
                let (plus_di, minus_di) = if tr == 0.0 {
                    (0.0, 0.0)
                } else {
                    (100.0 * plus / tr, 100.0 * minus / tr)
                };
                let di_sum = plus_di + minus_di;
                if di_sum == 0.0 {
                    0.0
                } else {
                    100.0 * (plus_di - minus_di).abs() / di_sum
                }
            })
            .collect();

        let recent = &dx[dx.len().saturating_sub(self.period)..];
        recent.iter().sum::<f64>() / recent.len() as f64
    }
}

impl Default for AdxIndicator {
    fn default() -> Self {
        Self::new(14)
    }
}

/// Wilder running-sum smoothing:
/// `s[0] = sum(raw[..period])`, `s[i] = s[i-1] - s[i-1] / period + raw[period - 1 + i]`.
fn wilder_smooth(raw: &[f64], period: usize) -> Vec<f64> {
    if raw.len() < period {
        return Vec::new();
    }
    let mut smoothed = Vec::with_capacity(raw.len() - period + 1);
    let mut current: f64 = raw[..period].iter().sum();
    smoothed.push(current);
    for &value in &raw[period..] {
        current = current - current / period as f64 + value;
        smoothed.push(current);
    }
    smoothed
}
