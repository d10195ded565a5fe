use serde::{Deserialize, Serialize};

/// One OHLCV candle as delivered by the price feed.
///
/// Times are Unix milliseconds. A candle sequence handed to the analyzer or
/// the simulator must be strictly ordered by time, one candle per interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Carried through from the feed; unused by the indicators.
    #[serde(default)]
    pub quote_asset_volume: f64,
    #[serde(default)]
    pub number_of_trades: u64,
    #[serde(default)]
    pub taker_buy_base_asset_volume: f64,
    #[serde(default)]
    pub taker_buy_quote_asset_volume: f64,
}

impl Candle {
    /// Build a candle from plain OHLCV values. `close_time` is set to the last
    /// millisecond of the interval, matching Binance kline semantics.
    pub fn from_ohlcv(
        open_time: i64,
        interval_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            open_time,
            close_time: open_time + interval_ms - 1,
            open,
            high,
            low,
            close,
            volume,
            quote_asset_volume: 0.0,
            number_of_trades: 0,
            taker_buy_base_asset_volume: 0.0,
            taker_buy_quote_asset_volume: 0.0,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Two-valued market direction (EMA cross, trend filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Bullish => write!(f, "BULLISH"),
            Direction::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Trend classification produced by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Bullish => write!(f, "BULLISH"),
            Trend::Bearish => write!(f, "BEARISH"),
            Trend::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Where the current price sits relative to the nearest pivot levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SrPosition {
    NearSupport,
    NearResistance,
    AwayFromLevels,
}

impl std::fmt::Display for SrPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SrPosition::NearSupport => write!(f, "NEAR_SUPPORT"),
            SrPosition::NearResistance => write!(f, "NEAR_RESISTANCE"),
            SrPosition::AwayFromLevels => write!(f, "AWAY_FROM_LEVELS"),
        }
    }
}

/// Why the analyzer stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisNote {
    /// ADX below the trend-strength threshold.
    Choppy,
}

/// Indicator values computed for one evaluation point.
///
/// Every field is optional: the choppy-market short-circuit only fills
/// `rsi`, `adx` and `note`, and a too-short window fills nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
    pub ema_trend: Option<Direction>,
    /// EMA over the trend period (50) of the analysis window.
    pub ema_trend_long: Option<f64>,
    pub trend_filter: Option<Direction>,
    pub sr_position: Option<SrPosition>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub ngtcv: Option<f64>,
    pub atr: Option<f64>,
    pub macd_line: Option<f64>,
    pub signal_line: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub adx: Option<f64>,
    pub is_bullish_engulfing: Option<bool>,
    pub is_bearish_engulfing: Option<bool>,
    pub note: Option<AnalysisNote>,
}

impl IndicatorSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Output of one analyzer evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub trend: Trend,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub snapshot: IndicatorSnapshot,
}

impl Analysis {
    pub fn neutral(snapshot: IndicatorSnapshot) -> Self {
        Self {
            trend: Trend::Neutral,
            confidence: 0.0,
            snapshot,
        }
    }
}

/// Side of a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Percentage return from `entry` to `exit`, positive when the move
    /// favours this side. Zero for a non-positive entry price.
    pub fn pnl_pct(self, entry: f64, exit: f64) -> f64 {
        if entry <= 0.0 {
            return 0.0;
        }
        match self {
            TradeSide::Buy => (exit - entry) / entry * 100.0,
            TradeSide::Sell => (entry - exit) / entry * 100.0,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Action recommended by the signal generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Action {
    /// The trade side this action opens, `None` for `Hold`.
    pub fn side(self) -> Option<TradeSide> {
        match self {
            Action::Buy => Some(TradeSide::Buy),
            Action::Sell => Some(TradeSide::Sell),
            Action::Hold => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// Trading decision derived from an [`Analysis`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Signal {
    pub action: Action,
    pub confidence: f64,
}

impl Signal {
    pub fn hold() -> Self {
        Self::default()
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "SL"),
            ExitReason::TakeProfit => write!(f, "TP"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeResult {
    Win,
    Loss,
}

impl std::fmt::Display for TradeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeResult::Win => write!(f, "WIN"),
            TradeResult::Loss => write!(f, "LOSS"),
        }
    }
}

/// Snapshot-derived metadata recorded when a trade is opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeContext {
    pub sr_position: Option<SrPosition>,
    pub trend_filter: Option<Direction>,
    pub ema_trend: Option<Direction>,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
    pub is_bullish_engulfing: bool,
    pub is_bearish_engulfing: bool,
}

impl From<&IndicatorSnapshot> for TradeContext {
    fn from(s: &IndicatorSnapshot) -> Self {
        Self {
            sr_position: s.sr_position,
            trend_filter: s.trend_filter,
            ema_trend: s.ema_trend,
            rsi: s.rsi,
            adx: s.adx,
            is_bullish_engulfing: s.is_bullish_engulfing.unwrap_or(false),
            is_bearish_engulfing: s.is_bearish_engulfing.unwrap_or(false),
        }
    }
}

/// A simulated position. Exit fields are `None` while the trade is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: TradeSide,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_time: i64,
    pub confidence: f64,
    pub context: TradeContext,
    pub exit_time: Option<i64>,
    pub exit_price: Option<f64>,
    pub exit_reason: Option<ExitReason>,
    pub pnl_pct: Option<f64>,
    pub result: Option<TradeResult>,
}

impl Trade {
    pub fn open(
        side: TradeSide,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
        entry_time: i64,
    ) -> Self {
        Self {
            side,
            entry_price,
            stop_loss,
            take_profit,
            entry_time,
            confidence: 0.0,
            context: TradeContext::default(),
            exit_time: None,
            exit_price: None,
            exit_reason: None,
            pnl_pct: None,
            result: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Close the trade at `exit_price`. Consumes the open trade so a closed
    /// trade can never be closed twice.
    pub fn close(mut self, exit_price: f64, exit_time: i64, reason: ExitReason) -> Self {
        let pnl = self.side.pnl_pct(self.entry_price, exit_price);
        self.exit_time = Some(exit_time);
        self.exit_price = Some(exit_price);
        self.exit_reason = Some(reason);
        self.pnl_pct = Some(pnl);
        self.result = Some(if pnl > 0.0 {
            TradeResult::Win
        } else {
            TradeResult::Loss
        });
        self
    }
}

/// Running performance counters for a backtest or a live session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_signals: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub total_pnl_pct: f64,
}

impl Stats {
    /// Fraction of signals that were correct, in `[0, 1]`.
    pub fn win_rate(&self) -> f64 {
        if self.total_signals == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total_signals as f64
    }

    /// Account for a closed trade. `total_signals` is counted on open.
    pub fn record_closed(&mut self, trade: &Trade) {
        let pnl = trade.pnl_pct.unwrap_or(0.0);
        match trade.result {
            Some(TradeResult::Win) => self.correct += 1,
            Some(TradeResult::Loss) | None => self.incorrect += 1,
        }
        self.total_pnl_pct += pnl;
    }

    /// Account for a judged live prediction. `change_pct` is the absolute
    /// price move that decided it.
    pub fn record_prediction(&mut self, correct: bool, change_pct: f64) {
        self.total_signals += 1;
        if correct {
            self.correct += 1;
            self.total_pnl_pct += change_pct;
        } else {
            self.incorrect += 1;
            self.total_pnl_pct -= change_pct;
        }
    }
}

/// Operator-facing notifications emitted by the live loop.
#[derive(Debug, Clone)]
pub enum Alert {
    Started {
        symbol: String,
        interval: String,
    },
    Signal {
        symbol: String,
        interval: String,
        signal: Signal,
        price: f64,
        snapshot: IndicatorSnapshot,
    },
    Accuracy {
        stats: Stats,
    },
    Stopped,
}
