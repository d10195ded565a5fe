use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Every variable has a default except the Telegram credentials, which only
/// the live loop requires. Malformed values cause an immediate panic with a
/// clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Market
    pub symbol: String,
    pub interval: String,
    pub higher_interval: String,
    pub candle_limit: usize,
    pub backtest_limit: usize,

    // Telegram
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<i64>,

    // Strategy config file path
    pub strategy_config_path: String,

    // Live-loop state file
    pub state_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let interval = optional_env("INTERVAL").unwrap_or_else(|| "15m".to_string());
        if interval_duration(&interval).is_none() {
            panic!("ERROR: INTERVAL must look like '15m', '1h' or '1d', got: '{interval}'");
        }

        let telegram_chat_id = optional_env("TELEGRAM_CHAT_ID").map(|v| {
            v.trim().parse::<i64>().unwrap_or_else(|_| {
                panic!("TELEGRAM_CHAT_ID must be a numeric chat ID, got: '{}'", v.trim())
            })
        });

        Config {
            symbol: optional_env("SYMBOL").unwrap_or_else(|| "BTCUSDT".to_string()),
            interval,
            higher_interval: optional_env("HIGHER_INTERVAL").unwrap_or_else(|| "1h".to_string()),
            candle_limit: parsed_env("CANDLE_LIMIT", 100),
            backtest_limit: parsed_env("BACKTEST_LIMIT", 1000),
            telegram_token: optional_env("TELEGRAM_BOT_TOKEN").filter(|t| !t.is_empty()),
            telegram_chat_id,
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
            state_path: optional_env("STATE_PATH").unwrap_or_else(|| "bot_state.json".to_string()),
        }
    }

    /// How long one candle of the primary interval lasts.
    pub fn poll_period(&self) -> Duration {
        interval_duration(&self.interval).unwrap_or(Duration::from_secs(900))
    }
}

/// Parse a Binance interval string ("1m", "15m", "1h", "4h", "1d", "1w").
pub fn interval_duration(interval: &str) -> Option<Duration> {
    let interval = interval.trim();
    let unit = interval.chars().last()?;
    let amount: u64 = interval[..interval.len() - unit.len_utf8()].parse().ok()?;
    if amount == 0 {
        return None;
    }
    let unit_secs = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        'w' => 604_800,
        _ => return None,
    };
    Some(Duration::from_secs(amount * unit_secs))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match optional_env(key) {
        Some(v) => v
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("Environment variable '{key}' has an invalid value: '{v}'")),
        None => default,
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_intervals() {
        assert_eq!(interval_duration("15m"), Some(Duration::from_secs(900)));
        assert_eq!(interval_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(interval_duration("4h"), Some(Duration::from_secs(14_400)));
        assert_eq!(interval_duration("1d"), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn rejects_malformed_intervals() {
        assert_eq!(interval_duration(""), None);
        assert_eq!(interval_duration("m"), None);
        assert_eq!(interval_duration("0m"), None);
        assert_eq!(interval_duration("15x"), None);
    }
}
