pub mod chain;
pub mod greeks;
pub mod pricing;

pub use chain::{chain_snapshot, ChainEntry, ChainSide};
pub use greeks::{compute_greeks, strike_for_delta, time_to_expiry, VolInput};
pub use pricing::{implied_volatility, price};
