//! Deterministic parameter-sweep backtester for the covered-call strategy.

pub mod engine;
pub mod grid;

pub use engine::{run_backtest, BacktestConfig};
pub use grid::{BacktestResult, ParameterGrid};
