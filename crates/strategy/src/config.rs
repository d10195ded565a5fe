use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Error, Result};
use risk::RiskConfig;

use crate::indicators::NgtcvWeights;

/// Top-level strategy config file (TOML). Every section and key is optional.
///
/// Example `config/strategy.toml`:
/// ```toml
/// [analyzer]
/// rsi_period = 14
/// rsi_overbought = 70.0
/// rsi_oversold = 30.0
/// min_confidence = 0.6
///
/// [analyzer.ngtcv_weights]
/// body = 0.6
/// wick = -0.2
/// volume = 0.2
///
/// [risk]
/// atr_multiplier_sl = 2.0
/// atr_multiplier_tp = 3.0
///
/// [backtest]
/// warmup = 200
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyFileConfig {
    pub analyzer: AnalyzerConfig,
    pub risk: RiskConfig,
    pub backtest: BacktestSettings,
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read strategy config at '{}': {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("in '{}': {e}", path.display())))
    }

    /// Load from a TOML file, or fall back to the built-in defaults when the
    /// file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No strategy config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse strategy config: {e}")))
    }
}

/// Every tunable of the market analyzer.
///
/// The scoring weights, the 1.5 score gate and the 7.8 normalization constant
/// are empirical; they are kept as defaults here rather than derived.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,

    pub ema_short_period: usize,
    pub ema_long_period: usize,
    /// Same-timeframe EMA that price is compared against.
    pub ema_trend_period: usize,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    pub adx_period: usize,
    /// Below this ADX the market is treated as choppy and not scored.
    pub adx_threshold: f64,

    pub atr_period: usize,

    /// EMA period applied to higher-timeframe closes for the trend filter.
    pub higher_tf_ema_period: usize,
    /// Minimum higher-timeframe candles before that filter is used.
    pub higher_tf_min_candles: usize,
    /// Same-timeframe EMA period used when the higher timeframe is unusable.
    pub fallback_trend_ema_period: usize,

    pub ngtcv_weights: NgtcvWeights,
    pub ngtcv_volume_lookback: usize,
    /// Number of most recent candles averaged for the ngtCV score.
    pub ngtcv_candles: usize,

    pub sr_period: usize,
    pub sr_tolerance: f64,

    /// Shortest window analyzed at all (the EMA trend period also applies).
    pub min_window: usize,

    pub scoring: ScoringWeights,
    pub min_confidence: f64,
    pub score_gate: f64,
    pub max_score: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            ema_short_period: 12,
            ema_long_period: 26,
            ema_trend_period: 50,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            adx_threshold: 20.0,
            atr_period: 14,
            higher_tf_ema_period: 50,
            higher_tf_min_candles: 50,
            fallback_trend_ema_period: 200,
            ngtcv_weights: NgtcvWeights::default(),
            ngtcv_volume_lookback: 20,
            ngtcv_candles: 3,
            sr_period: 10,
            sr_tolerance: 0.003,
            min_window: 30,
            scoring: ScoringWeights::default(),
            min_confidence: 0.6,
            score_gate: 1.5,
            max_score: 7.8,
        }
    }
}

impl AnalyzerConfig {
    /// Windows shorter than this are returned as NEUTRAL with no indicators.
    /// Never below 2: the engulfing check needs the previous candle.
    pub fn required_window(&self) -> usize {
        self.min_window.max(self.ema_trend_period).max(2)
    }
}

/// Contribution of each scoring component, as positive magnitudes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// RSI extreme confirmed by an engulfing candle in the filter direction.
    pub rsi_engulfing: f64,
    /// RSI extreme in the filter direction.
    pub rsi_extreme: f64,
    /// RSI extreme against the filter direction.
    pub rsi_counter: f64,
    pub price_vs_trend_ema: f64,
    pub ema_cross: f64,
    pub macd: f64,
    pub ngtcv: f64,
    /// |ngtCV| must exceed this to count.
    pub ngtcv_threshold: f64,
    pub near_level: f64,
    /// Flat penalty when price is away from every level.
    pub away_from_levels: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rsi_engulfing: 3.0,
            rsi_extreme: 2.0,
            rsi_counter: 0.5,
            price_vs_trend_ema: 0.5,
            ema_cross: 1.0,
            macd: 0.8,
            ngtcv: 0.5,
            ngtcv_threshold: 0.1,
            near_level: 1.0,
            away_from_levels: 0.5,
        }
    }
}

/// Replay settings for the backtest simulator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// First candle index evaluated; earlier candles only feed indicators.
    pub warmup: usize,
    /// Move the stop to entry once an open trade is past the breakeven threshold.
    pub use_breakeven: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            warmup: 200,
            use_breakeven: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = StrategyFileConfig::parse("").unwrap();
        assert_eq!(cfg.analyzer.rsi_period, 14);
        assert_eq!(cfg.analyzer.max_score, 7.8);
        assert_eq!(cfg.analyzer.required_window(), 50);
        assert_eq!(cfg.backtest.warmup, 200);
        assert_eq!(cfg.risk.atr_multiplier_sl, 2.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = StrategyFileConfig::parse(
            r#"
            [analyzer]
            rsi_oversold = 25.0
            min_confidence = 0.3

            [analyzer.ngtcv_weights]
            body = 0.5
            wick = -0.3
            volume = 0.1

            [backtest]
            use_breakeven = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analyzer.rsi_oversold, 25.0);
        assert_eq!(cfg.analyzer.rsi_overbought, 70.0);
        assert_eq!(cfg.analyzer.min_confidence, 0.3);
        assert_eq!(cfg.analyzer.ngtcv_weights.body, 0.5);
        assert!(cfg.backtest.use_breakeven);
        assert_eq!(cfg.backtest.warmup, 200);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = StrategyFileConfig::parse("[analyzer]\nrsi_period = \"fourteen\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = StrategyFileConfig::parse(include_str!("../../../config/strategy.toml")).unwrap();
        let defaults = StrategyFileConfig::default();
        assert_eq!(shipped.analyzer.scoring, defaults.analyzer.scoring);
        assert_eq!(shipped.analyzer.ngtcv_weights, defaults.analyzer.ngtcv_weights);
        assert_eq!(shipped.analyzer.min_confidence, defaults.analyzer.min_confidence);
        assert_eq!(shipped.analyzer.fallback_trend_ema_period, 200);
        assert_eq!(shipped.risk, defaults.risk);
        assert_eq!(shipped.backtest, defaults.backtest);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = StrategyFileConfig::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(cfg.analyzer.adx_threshold, 20.0);
    }
}
