pub mod report;
pub mod simulator;

pub use report::BacktestReport;
pub use simulator::{check_exit, Position, SimulationState, Simulator};
