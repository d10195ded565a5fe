pub mod targets;

pub use targets::{BreakevenStatus, BreakevenUpdate, RiskConfig, Targets};
