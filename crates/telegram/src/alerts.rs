use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::{info, warn};

use common::{Action, Alert, AlertSink, Error, IndicatorSnapshot, Result, Signal};

/// Sends alerts to one Telegram chat as Markdown messages.
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn deliver(&self, alert: &Alert) -> Result<()> {
        let text = format_alert(alert);
        match self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Markdown)
            .await
        {
            Ok(_) => {
                info!(chat_id = self.chat_id.0, "Telegram message sent");
                Ok(())
            }
            Err(e) => {
                warn!(chat_id = self.chat_id.0, error = %e, "Failed to send Telegram alert");
                Err(Error::Notify(e.to_string()))
            }
        }
    }
}

// ─── Formatting ───────────────────────────────────────────────────────────────

pub fn format_alert(alert: &Alert) -> String {
    match alert {
        Alert::Started { symbol, interval } => {
            format!("🚀 *Bot Started*\nSymbol: `{symbol}`\nInterval: `{interval}`")
        }
        Alert::Signal {
            symbol,
            interval,
            signal,
            price,
            snapshot,
        } => format_signal(symbol, interval, signal, *price, snapshot),
        Alert::Accuracy { stats } => format!(
            "📊 *Accuracy Update*\nWin Rate: `{:.1}%`\n({}/{})",
            stats.win_rate() * 100.0,
            stats.correct,
            stats.total_signals
        ),
        Alert::Stopped => "🛑 *Bot Stopped*".to_string(),
    }
}

fn format_signal(
    symbol: &str,
    interval: &str,
    signal: &Signal,
    price: f64,
    snapshot: &IndicatorSnapshot,
) -> String {
    let icon = if signal.action == Action::Buy { "🟢" } else { "🔴" };
    let ema_trend = snapshot
        .ema_trend
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let mut msg = format!("{icon} *TRADING SIGNAL: {}*\n\n", signal.action);
    msg.push_str(&format!("Symbol: `{symbol}`\n"));
    msg.push_str(&format!("Interval: `{interval}`\n"));
    msg.push_str(&format!("Price: `{price}`\n"));
    msg.push_str(&format!("Confidence: `{:.2}`\n\n", signal.confidence));
    msg.push_str("*Indicators:*\n");
    msg.push_str(&format!("RSI: `{:.2}`\n", snapshot.rsi.unwrap_or(0.0)));
    msg.push_str(&format!("EMA Trend: `{ema_trend}`\n"));
    msg.push_str(&format!("ngtCV: `{:.4}`\n", snapshot.ngtcv.unwrap_or(0.0)));
    msg
}
