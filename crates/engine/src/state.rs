use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use common::{Candle, Result, Signal, Stats};

/// What the live loop remembers between cycles and across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotState {
    /// Last signal emitted (HOLD included); judged on the next cycle.
    pub previous_signal: Option<Signal>,
    /// Candle the previous signal was generated on.
    pub previous_candle: Option<Candle>,
    pub stats: Stats,
}

impl BotState {
    /// Load from a JSON file. A missing file gives a fresh state.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let state: Self = serde_json::from_str(&content)?;
                info!(
                    path = %path.display(),
                    signals = state.stats.total_signals,
                    "Bot state restored"
                );
                Ok(state)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No saved state, starting fresh");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        debug!(path = %path.display(), "Bot state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Action;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("signalbot-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_gives_fresh_state() {
        let state = BotState::load(scratch_path("missing")).await.unwrap();
        assert_eq!(state, BotState::default());
    }

    #[tokio::test]
    async fn save_then_load_restores_state() {
        let path = scratch_path("roundtrip");
        let mut state = BotState {
            previous_signal: Some(Signal {
                action: Action::Sell,
                confidence: 0.72,
            }),
            previous_candle: Some(Candle::from_ohlcv(0, 900_000, 1.0, 2.0, 0.5, 1.5, 10.0)),
            ..BotState::default()
        };
        state.stats.record_prediction(true, 0.4);

        state.save(&path).await.unwrap();
        let loaded = BotState::load(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let path = scratch_path("corrupt");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let result = BotState::load(&path).await;
        let _ = tokio::fs::remove_file(&path).await;
        assert!(matches!(result, Err(common::Error::Json(_))));
    }
}
