pub mod binance;
pub mod lifecycle;
pub mod state;

pub use binance::BinanceKlines;
pub use lifecycle::{LoopSettings, SignalLoop};
pub use state::BotState;
