pub mod covered_call;
pub mod sell_put;
pub mod signal;

pub use covered_call::{evaluate_covered_call, evaluate_covered_calls};
pub use sell_put::evaluate_sell_put;
pub use signal::{Action, StrategySignal};
