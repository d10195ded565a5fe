//! Two-candle engulfing patterns.

use common::Candle;

/// Current candle is bullish and its body strictly contains the previous
/// candle's open/close range on both sides.
pub fn is_bullish_engulfing(previous: &Candle, current: &Candle) -> bool {
    let prev_low = previous.open.min(previous.close);
    let prev_high = previous.open.max(previous.close);
    current.is_bullish() && current.open < prev_low && current.close > prev_high
}

/// Mirror of [`is_bullish_engulfing`] for a bearish current candle.
pub fn is_bearish_engulfing(previous: &Candle, current: &Candle) -> bool {
    let prev_low = previous.open.min(previous.close);
    let prev_high = previous.open.max(previous.close);
    current.is_bearish() && current.open > prev_high && current.close < prev_low
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(open: f64, close: f64) -> Candle {
        Candle::from_ohlcv(0, 60_000, open, open.max(close) + 1.0, open.min(close) - 1.0, close, 1.0)
    }

    #[test]
    fn bullish_engulfing_detected() {
        assert!(is_bullish_engulfing(&body(101.0, 100.0), &body(99.5, 102.0)));
        assert!(!is_bearish_engulfing(&body(101.0, 100.0), &body(99.5, 102.0)));
    }

    #[test]
    fn bearish_engulfing_detected() {
        assert!(is_bearish_engulfing(&body(100.0, 101.0), &body(101.5, 99.0)));
        assert!(!is_bullish_engulfing(&body(100.0, 101.0), &body(101.5, 99.0)));
    }

    #[test]
    fn touching_bodies_do_not_engulf() {
        // Open equal to the previous low edge: not strictly containing.
        assert!(!is_bullish_engulfing(&body(101.0, 100.0), &body(100.0, 102.0)));
        assert!(!is_bearish_engulfing(&body(100.0, 101.0), &body(101.0, 99.0)));
    }

    #[test]
    fn smaller_body_does_not_engulf() {
        assert!(!is_bullish_engulfing(&body(98.0, 104.0), &body(99.0, 103.0)));
    }
}
