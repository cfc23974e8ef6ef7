//! Parameter grid swept by the backtester.

use folio_core::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterGrid {
    /// Bubble-score thresholds gating the call rule.
    pub thresholds: Vec<f64>,
    /// Target deltas for strike selection.
    pub target_deltas: Vec<f64>,
}

impl ParameterGrid {
    pub fn validate(&self) -> Result<()> {
        if self.thresholds.is_empty() || self.target_deltas.is_empty() {
            return Err(Error::InvalidConfiguration(
                "parameter grid must name at least one threshold and one delta".to_string(),
            ));
        }
        if let Some(t) = self
            .thresholds
            .iter()
            .find(|t| !(0.0..=100.0).contains(*t))
        {
            return Err(Error::InvalidConfiguration(format!(
                "grid threshold out of [0, 100]: {t}"
            )));
        }
        if let Some(d) = self
            .target_deltas
            .iter()
            .find(|d| !(0.0 < **d && **d < 1.0))
        {
            return Err(Error::InvalidConfiguration(format!(
                "grid delta out of (0, 1): {d}"
            )));
        }
        Ok(())
    }

    /// Cartesian product in supplied order — threshold-major, so output
    /// ordering is reproducible.
    pub fn combinations(&self) -> Vec<(f64, f64)> {
        self.thresholds
            .iter()
            .flat_map(|t| self.target_deltas.iter().map(move |d| (*t, *d)))
            .collect()
    }
}

/// Aggregate outcome for one (threshold, delta) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub threshold: f64,
    pub target_delta: f64,
    pub trades: usize,
    pub win_rate: f64,
    pub assignment_rate: f64,
    /// Annualized strategy return minus annualized buy-and-hold return
    /// over the same span.
    pub annualized_excess_return: f64,
}
