pub mod analyzer;
pub mod config;
pub mod indicators;
pub mod signal;

pub use analyzer::{MarketAnalyzer, ScoreInputs};
pub use config::{AnalyzerConfig, BacktestSettings, ScoringWeights, StrategyFileConfig};
pub use signal::{evaluate_prediction, generate_signal, PredictionOutcome};
