use common::{Action, Analysis, Candle, Signal, Trend};

/// Moves smaller than this percentage are too small to judge a prediction.
pub const MIN_EVALUATION_CHANGE_PCT: f64 = 0.1;

/// Project an analysis onto a trading action.
pub fn generate_signal(analysis: &Analysis) -> Signal {
    match analysis.trend {
        Trend::Bullish => Signal {
            action: Action::Buy,
            confidence: analysis.confidence,
        },
        Trend::Bearish => Signal {
            action: Action::Sell,
            confidence: analysis.confidence,
        },
        Trend::Neutral => Signal::hold(),
    }
}

/// Outcome of a live prediction judged against the following candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionOutcome {
    pub correct: bool,
    /// Absolute close-to-close move in percent.
    pub change_pct: f64,
}

/// Judge `prediction`, made at `previous`, by where `current` closed.
///
/// Returns `None` for a HOLD, a move under [`MIN_EVALUATION_CHANGE_PCT`], or
/// an unusable previous close.
pub fn evaluate_prediction(
    previous: &Candle,
    current: &Candle,
    prediction: &Signal,
) -> Option<PredictionOutcome> {
    let predicted_up = match prediction.action {
        Action::Buy => true,
        Action::Sell => false,
        Action::Hold => return None,
    };
    if previous.close <= 0.0 {
        return None;
    }

    let change_pct = (current.close - previous.close) / previous.close * 100.0;
    if change_pct.abs() < MIN_EVALUATION_CHANGE_PCT {
        return None;
    }

    Some(PredictionOutcome {
        correct: predicted_up == (change_pct > 0.0),
        change_pct: change_pct.abs(),
    })
}
