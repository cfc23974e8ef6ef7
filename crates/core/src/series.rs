//! Daily close price series and the return math built on it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Ordered sequence of (date, close) pairs. Immutable once constructed;
/// the constructor enforces strictly ascending dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    /// Builds a series, rejecting unordered or duplicate dates.
    pub fn new(symbol: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(Error::UnorderedSeries { index: i + 1 });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|(_, c)| *c).collect()
    }

    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    /// Prefix of the series ending at `date` (inclusive). Used by the
    /// backtester so no decision can see past its evaluation date.
    pub fn truncated(&self, date: NaiveDate) -> Self {
        let end = self.points.partition_point(|(d, _)| *d <= date);
        Self {
            symbol: self.symbol.clone(),
            points: self.points[..end].to_vec(),
        }
    }

    /// Daily log returns, skipping non-positive closes.
    pub fn log_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .filter(|w| w[0].1 > 0.0 && w[1].1 > 0.0)
            .map(|w| (w[1].1 / w[0].1).ln())
            .collect()
    }

    /// Daily simple returns.
    pub fn simple_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .filter(|w| w[0].1 > 0.0)
            .map(|w| w[1].1 / w[0].1 - 1.0)
            .collect()
    }

    /// Simple moving average over the trailing `window` closes.
    pub fn sma(&self, window: usize) -> Option<f64> {
        if window == 0 || self.points.len() < window {
            return None;
        }
        let tail = &self.points[self.points.len() - window..];
        Some(tail.iter().map(|(_, c)| c).sum::<f64>() / window as f64)
    }
}

/// Sample standard deviation (ddof = 1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Annualized volatility of the trailing `window` daily returns.
pub fn annualized_vol(returns: &[f64], window: usize) -> Option<f64> {
    if returns.len() < window {
        return None;
    }
    let tail = &returns[returns.len() - window..];
    std_dev(tail).map(|s| s * TRADING_DAYS_PER_YEAR.sqrt())
}
