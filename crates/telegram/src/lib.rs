pub mod alerts;

pub use alerts::{format_alert, TelegramNotifier};
