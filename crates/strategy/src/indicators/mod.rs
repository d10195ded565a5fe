//! Pure indicator functions over a candle or price window (oldest first).
//!
//! Every indicator falls back to a documented neutral value when the window
//! is too short instead of failing: RSI 50, ADX 25, EMA the plain average,
//! MACD all zeros, ATR 0.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod levels;
pub mod macd;
pub mod ngtcv;
pub mod patterns;
pub mod rsi;

pub use adx::AdxIndicator;
pub use atr::{true_range, AtrIndicator};
pub use ema::{ema, ema_series, EmaSeries};
pub use levels::{Levels, SupportResistance};
pub use macd::{Macd, MacdIndicator};
pub use ngtcv::{NgtcvBreakdown, NgtcvIndicator, NgtcvWeights};
pub use patterns::{is_bearish_engulfing, is_bullish_engulfing};
pub use rsi::RsiIndicator;
