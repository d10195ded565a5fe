use tracing::debug;

use common::{Analysis, AnalysisNote, Candle, Direction, IndicatorSnapshot, SrPosition, Trend};

use crate::config::AnalyzerConfig;
use crate::indicators::{
    ema, is_bearish_engulfing, is_bullish_engulfing, AdxIndicator, AtrIndicator, Macd,
    MacdIndicator, NgtcvIndicator, RsiIndicator, SupportResistance,
};

/// Combines the indicator library into a trend call with a confidence score.
///
/// Stateless between calls: the same window and configuration always give
/// the same [`Analysis`].
#[derive(Debug, Clone)]
pub struct MarketAnalyzer {
    config: AnalyzerConfig,
    rsi: RsiIndicator,
    macd: MacdIndicator,
    adx: AdxIndicator,
    atr: AtrIndicator,
    ngtcv: NgtcvIndicator,
    levels: SupportResistance,
}

/// Everything the weighted score looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub trend_filter: Direction,
    pub price: f64,
    pub rsi: f64,
    pub is_bullish_engulfing: bool,
    pub is_bearish_engulfing: bool,
    pub ema_trend_long: f64,
    pub ema_cross: Direction,
    pub macd: Macd,
    pub ngtcv: f64,
    pub sr_position: SrPosition,
}

impl MarketAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            rsi: RsiIndicator::new(config.rsi_period, config.rsi_overbought, config.rsi_oversold),
            macd: MacdIndicator::new(config.macd_fast, config.macd_slow, config.macd_signal),
            adx: AdxIndicator::new(config.adx_period),
            atr: AtrIndicator::new(config.atr_period),
            ngtcv: NgtcvIndicator::new(config.ngtcv_weights, config.ngtcv_volume_lookback),
            levels: SupportResistance::new(config.sr_period, config.sr_tolerance),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// ATR of `window` with the configured period.
    pub fn atr(&self, window: &[Candle]) -> f64 {
        self.atr.compute(window)
    }

    /// Analyze the window ending at its last candle.
    ///
    /// `higher_tf` must only contain candles that closed at or before the
    /// last candle of `window`.
    pub fn analyze(&self, window: &[Candle], higher_tf: Option<&[Candle]>) -> Analysis {
        let Some(current) = window.last() else {
            return Analysis::neutral(IndicatorSnapshot::default());
        };
        if window.len() < self.config.required_window() {
            return Analysis::neutral(IndicatorSnapshot::default());
        }

        let closes: Vec<f64> = window.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = window.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = window.iter().map(|c| c.low).collect();
        let price = current.close;

        let rsi = self.rsi.compute(&closes);
        let adx = self.adx.compute(&highs, &lows, &closes);

        if adx < self.config.adx_threshold {
            debug!(adx, rsi, "Choppy market, skipping scoring");
            return Analysis::neutral(IndicatorSnapshot {
                rsi: Some(rsi),
                adx: Some(adx),
                note: Some(AnalysisNote::Choppy),
                ..IndicatorSnapshot::default()
            });
        }

        let trend_filter = self.trend_filter(&closes, higher_tf);

        let ema_short = ema(&closes, self.config.ema_short_period);
        let ema_long = ema(&closes, self.config.ema_long_period);
        let ema_cross = if ema_short > ema_long {
            Direction::Bullish
        } else {
            Direction::Bearish
        };
        let ema_trend_long = ema(&closes, self.config.ema_trend_period);

        let macd = self.macd.compute(&closes);
        let ngtcv = self.ngtcv.recent_average(window, self.config.ngtcv_candles);
        let atr = self.atr.compute(window);
        let levels = self.levels.classify(price, window);

        let previous = &window[window.len() - 2];
        let bullish_engulfing = is_bullish_engulfing(previous, current);
        let bearish_engulfing = is_bearish_engulfing(previous, current);

        let score = self.score(&ScoreInputs {
            trend_filter,
            price,
            rsi,
            is_bullish_engulfing: bullish_engulfing,
            is_bearish_engulfing: bearish_engulfing,
            ema_trend_long,
            ema_cross,
            macd,
            ngtcv,
            sr_position: levels.position,
        });
        let (trend, confidence) = self.classify(score);

        debug!(
            %trend,
            score,
            confidence,
            rsi,
            adx,
            %trend_filter,
            sr = %levels.position,
            "Market analyzed"
        );

        Analysis {
            trend,
            confidence,
            snapshot: IndicatorSnapshot {
                rsi: Some(rsi),
                ema_short: Some(ema_short),
                ema_long: Some(ema_long),
                ema_trend: Some(ema_cross),
                ema_trend_long: Some(ema_trend_long),
                trend_filter: Some(trend_filter),
                sr_position: Some(levels.position),
                support: Some(levels.support),
                resistance: Some(levels.resistance),
                ngtcv: Some(ngtcv),
                atr: Some(atr),
                macd_line: Some(macd.macd_line),
                signal_line: Some(macd.signal_line),
                macd_histogram: Some(macd.histogram),
                adx: Some(adx),
                is_bullish_engulfing: Some(bullish_engulfing),
                is_bearish_engulfing: Some(bearish_engulfing),
                note: None,
            },
        }
    }

    /// Higher-timeframe EMA filter, falling back to a long same-timeframe EMA
    /// when the higher timeframe is missing or too short.
    pub fn trend_filter(&self, closes: &[f64], higher_tf: Option<&[Candle]>) -> Direction {
        let price = closes.last().copied().unwrap_or(0.0);
        let reference = match higher_tf {
            Some(htf) if htf.len() >= self.config.higher_tf_min_candles => {
                let htf_closes: Vec<f64> = htf.iter().map(|c| c.close).collect();
                ema(&htf_closes, self.config.higher_tf_ema_period)
            }
            _ => ema(closes, self.config.fallback_trend_ema_period),
        };
        if price > reference {
            Direction::Bullish
        } else {
            Direction::Bearish
        }
    }

    /// Weighted score. Components only count when they agree with the trend
    /// filter, apart from the small RSI counter-weight and the flat
    /// away-from-levels penalty.
    pub fn score(&self, inputs: &ScoreInputs) -> f64 {
        let w = &self.config.scoring;
        let overbought = self.rsi.is_overbought(inputs.rsi);
        let oversold = self.rsi.is_oversold(inputs.rsi);
        let mut score = 0.0;

        match inputs.trend_filter {
            Direction::Bullish => {
                if oversold && inputs.is_bullish_engulfing {
                    score += w.rsi_engulfing;
                } else if oversold {
                    score += w.rsi_extreme;
                } else if overbought {
                    score -= w.rsi_counter;
                }
                if inputs.price > inputs.ema_trend_long {
                    score += w.price_vs_trend_ema;
                }
                if inputs.ema_cross == Direction::Bullish {
                    score += w.ema_cross;
                }
                if inputs.macd.is_bullish() {
                    score += w.macd;
                }
                if inputs.ngtcv > w.ngtcv_threshold {
                    score += w.ngtcv;
                }
                if inputs.sr_position == SrPosition::NearSupport {
                    score += w.near_level;
                }
            }
            Direction::Bearish => {
                if overbought && inputs.is_bearish_engulfing {
                    score -= w.rsi_engulfing;
                } else if overbought {
                    score -= w.rsi_extreme;
                } else if oversold {
                    score += w.rsi_counter;
                }
                if inputs.price < inputs.ema_trend_long {
                    score -= w.price_vs_trend_ema;
                }
                if inputs.ema_cross == Direction::Bearish {
                    score -= w.ema_cross;
                }
                if inputs.macd.is_bearish() {
                    score -= w.macd;
                }
                if inputs.ngtcv < -w.ngtcv_threshold {
                    score -= w.ngtcv;
                }
                if inputs.sr_position == SrPosition::NearResistance {
                    score -= w.near_level;
                }
            }
        }

        if inputs.sr_position == SrPosition::AwayFromLevels {
            score -= w.away_from_levels;
        }

        score
    }

    /// Map a raw score to a trend and a confidence in `[0, 1]`.
    pub fn classify(&self, score: f64) -> (Trend, f64) {
        let confidence = if self.config.max_score > 0.0 {
            (score.abs() / self.config.max_score).min(1.0)
        } else {
            0.0
        };
        let confident = confidence >= self.config.min_confidence;

        let trend = if score >= self.config.score_gate && confident {
            Trend::Bullish
        } else if score <= -self.config.score_gate && confident {
            Trend::Bearish
        } else {
            Trend::Neutral
        };
        (trend, confidence)
    }
}

impl Default for MarketAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::from_ohlcv(i as i64 * 15 * MINUTE, 15 * MINUTE, open, high, low, close, 1000.0)
    }

    /// Alternating bars whose up and down moves always cancel: ADX is 0.
    fn choppy_window(n: usize, close_at: impl Fn(usize) -> f64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let (high, low) = if i % 2 == 0 { (102.0, 98.0) } else { (101.0, 99.0) };
                let close = close_at(i).clamp(low, high);
                candle(i, 100.0, high, low, close)
            })
            .collect()
    }

    fn uptrend(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(i, base - 0.5, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect()
    }

    fn bullish_inputs() -> ScoreInputs {
        ScoreInputs {
            trend_filter: Direction::Bullish,
            price: 100.0,
            rsi: 25.0,
            is_bullish_engulfing: true,
            is_bearish_engulfing: false,
            ema_trend_long: 99.0,
            ema_cross: Direction::Bullish,
            macd: Macd {
                macd_line: 1.0,
                signal_line: 0.5,
                histogram: 0.5,
            },
            ngtcv: 0.4,
            sr_position: SrPosition::NearSupport,
        }
    }

    #[test]
    fn short_window_is_neutral_and_empty() {
        let analyzer = MarketAnalyzer::default();
        let analysis = analyzer.analyze(&uptrend(49), None);
        assert_eq!(analysis.trend, Trend::Neutral);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.snapshot.is_empty());
        assert!(analyzer.analyze(&[], None).snapshot.is_empty());
    }

    #[test]
    fn single_candle_is_neutral_even_with_tiny_window_config() {
        let analyzer = MarketAnalyzer::new(AnalyzerConfig {
            min_window: 1,
            ema_trend_period: 1,
            adx_period: 1,
            adx_threshold: 0.0,
            ..AnalyzerConfig::default()
        });
        assert_eq!(analyzer.config().required_window(), 2);
        let analysis = analyzer.analyze(&uptrend(1), None);
        assert_eq!(analysis.trend, Trend::Neutral);
        assert!(analysis.snapshot.is_empty());
    }

    #[test]
    fn choppy_market_short_circuits_regardless_of_closes() {
        let analyzer = MarketAnalyzer::new(AnalyzerConfig {
            min_confidence: 0.0,
            ..AnalyzerConfig::default()
        });
        let patterns: Vec<Box<dyn Fn(usize) -> f64>> = vec![
            Box::new(|_| 100.0),
            Box::new(|i| if i % 2 == 0 { 102.0 } else { 99.0 }),
            Box::new(|i| 102.0 - (i as f64) * 0.05),
            Box::new(|i| 98.0 + (i as f64) * 0.05),
        ];
        for close_at in patterns {
            let window = choppy_window(120, close_at);
            let analysis = analyzer.analyze(&window, None);
            assert_eq!(analysis.trend, Trend::Neutral);
            assert_eq!(analysis.confidence, 0.0);
            assert_eq!(analysis.snapshot.note, Some(AnalysisNote::Choppy));
            assert_eq!(analysis.snapshot.adx, Some(0.0));
            assert!(analysis.snapshot.rsi.is_some());
            assert!(analysis.snapshot.ema_short.is_none());
            assert!(analysis.snapshot.trend_filter.is_none());
        }
    }

    #[test]
    fn trending_window_fills_the_snapshot() {
        let analyzer = MarketAnalyzer::default();
        let analysis = analyzer.analyze(&uptrend(250), None);
        let s = &analysis.snapshot;
        assert!(s.adx.unwrap() > 20.0);
        assert_eq!(s.trend_filter, Some(Direction::Bullish));
        assert_eq!(s.ema_trend, Some(Direction::Bullish));
        assert!(s.atr.unwrap() > 0.0);
        assert!(s.macd_line.is_some() && s.signal_line.is_some() && s.macd_histogram.is_some());
        assert!(s.sr_position.is_some());
        assert!(s.is_bullish_engulfing.is_some() && s.is_bearish_engulfing.is_some());
        assert!(s.note.is_none());
        assert!((0.0..=1.0).contains(&analysis.confidence));
    }

    #[test]
    fn analysis_is_deterministic() {
        let analyzer = MarketAnalyzer::default();
        let window = uptrend(250);
        assert_eq!(analyzer.analyze(&window, None), analyzer.analyze(&window, None));
    }

    #[test]
    fn higher_timeframe_drives_the_filter_when_long_enough() {
        let analyzer = MarketAnalyzer::default();
        let closes = vec![100.0; 10];
        // Higher timeframe trading far above the current price: bearish filter.
        let htf: Vec<Candle> = (0..60).map(|i| candle(i, 200.0, 201.0, 199.0, 200.0)).collect();
        assert_eq!(analyzer.trend_filter(&closes, Some(&htf)), Direction::Bearish);
        // Too short: falls back to the same-timeframe EMA (flat, so not above).
        assert_eq!(analyzer.trend_filter(&closes, Some(&htf[..10])), Direction::Bearish);
        let rising: Vec<f64> = (0..300).map(|i| 100.0 + i as f64).collect();
        assert_eq!(analyzer.trend_filter(&rising, Some(&htf[..10])), Direction::Bullish);
    }

    #[test]
    fn fully_aligned_bullish_score() {
        let analyzer = MarketAnalyzer::default();
        let score = analyzer.score(&bullish_inputs());
        // 3 + 0.5 + 1 + 0.8 + 0.5 + 1
        assert!((score - 6.8).abs() < 1e-9, "got {score}");
        let (trend, confidence) = analyzer.classify(score);
        assert_eq!(trend, Trend::Bullish);
        assert!((confidence - 6.8 / 7.8).abs() < 1e-9);
    }

    #[test]
    fn oversold_without_engulfing_scores_two() {
        let analyzer = MarketAnalyzer::default();
        let inputs = ScoreInputs {
            is_bullish_engulfing: false,
            ..bullish_inputs()
        };
        assert!((analyzer.score(&inputs) - 5.8).abs() < 1e-9);
    }

    #[test]
    fn components_against_the_filter_do_not_count() {
        let analyzer = MarketAnalyzer::default();
        // Bearish filter but every component points up.
        let inputs = ScoreInputs {
            trend_filter: Direction::Bearish,
            rsi: 50.0,
            ..bullish_inputs()
        };
        assert_eq!(analyzer.score(&inputs), 0.0);
    }

    #[test]
    fn bearish_mirror_and_counter_weight() {
        let analyzer = MarketAnalyzer::default();
        let inputs = ScoreInputs {
            trend_filter: Direction::Bearish,
            price: 100.0,
            rsi: 80.0,
            is_bullish_engulfing: false,
            is_bearish_engulfing: true,
            ema_trend_long: 101.0,
            ema_cross: Direction::Bearish,
            macd: Macd {
                macd_line: -1.0,
                signal_line: -0.5,
                histogram: -0.5,
            },
            ngtcv: -0.4,
            sr_position: SrPosition::NearResistance,
        };
        assert!((analyzer.score(&inputs) + 6.8).abs() < 1e-9);

        let counter = ScoreInputs {
            rsi: 20.0,
            ..inputs
        };
        // -6.8 + 3 (engulfing extreme gone) + 0.5 (oversold counter-weight)
        assert!((analyzer.score(&counter) + 3.3).abs() < 1e-9);
    }

    #[test]
    fn away_from_levels_is_a_flat_penalty() {
        let analyzer = MarketAnalyzer::default();
        let neutral = ScoreInputs {
            rsi: 50.0,
            price: 100.0,
            ema_trend_long: 100.0,
            macd: Macd::default(),
            ngtcv: 0.0,
            sr_position: SrPosition::AwayFromLevels,
            ema_cross: Direction::Bearish,
            ..bullish_inputs()
        };
        assert!((analyzer.score(&neutral) + 0.5).abs() < 1e-9);
        let bearish = ScoreInputs {
            trend_filter: Direction::Bearish,
            ema_cross: Direction::Bullish,
            ..neutral
        };
        assert!((analyzer.score(&bearish) + 0.5).abs() < 1e-9);
    }

    #[test]
    fn classification_needs_gate_and_confidence() {
        let analyzer = MarketAnalyzer::default();
        // Passes the 1.5 gate but 2.0 / 7.8 < 0.6.
        assert_eq!(analyzer.classify(2.0).0, Trend::Neutral);
        assert_eq!(analyzer.classify(-5.0).0, Trend::Bearish);

        let loose = MarketAnalyzer::new(AnalyzerConfig {
            min_confidence: 0.0,
            ..AnalyzerConfig::default()
        });
        assert_eq!(loose.classify(1.5).0, Trend::Bullish);
        assert_eq!(loose.classify(1.4).0, Trend::Neutral);
        assert_eq!(loose.classify(-1.5).0, Trend::Bearish);
    }
}
