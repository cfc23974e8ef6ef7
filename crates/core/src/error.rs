//! Error taxonomy shared across the workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A metric window is longer than the available history. Report-level
    /// callers degrade the single metric instead of failing the report.
    #[error("insufficient history: need {required} points, have {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    /// Implied-volatility inversion failed to converge, or the market price
    /// violates no-arbitrage bounds.
    #[error("volatility unsolvable: {reason}")]
    UnsolvableVolatility { reason: String },

    /// Malformed threshold, delta, or target parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Concurrent write detected on persisted monitor state.
    #[error("state conflict on target '{target}': record changed since read")]
    StateConflict { target: String },

    /// Price series input is not strictly ascending by date.
    #[error("price series out of order at index {index}")]
    UnorderedSeries { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
