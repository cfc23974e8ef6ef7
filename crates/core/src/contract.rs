//! Option contract and quote types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// One listed contract. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    pub underlying: String,
    pub expiry: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    pub last_price: Option<f64>,
    pub open_interest: Option<u64>,
}

/// Market quote for a contract.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OptionQuote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
}

impl OptionQuote {
    /// Reference price for trigger checks: last if traded, else mid,
    /// else whichever single side is quoted.
    pub fn reference_price(&self) -> Option<f64> {
        let pos = |v: Option<f64>| v.filter(|p| *p > 0.0);
        if let Some(last) = pos(self.last) {
            return Some(last);
        }
        match (pos(self.bid), pos(self.ask)) {
            (Some(b), Some(a)) => Some((b + a) / 2.0),
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }
}

/// Sensitivities attached to one contract at one spot/rate/valuation-time.
/// Always recomputed from current inputs, never cached across price moves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    /// Per calendar day.
    pub theta: f64,
    /// Per volatility point (1% = 0.01).
    pub vega: f64,
    pub implied_volatility: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_price_prefers_last_then_mid() {
        let q = OptionQuote { bid: Some(1.0), ask: Some(2.0), last: Some(1.8) };
        assert_eq!(q.reference_price(), Some(1.8));
        let q = OptionQuote { bid: Some(1.0), ask: Some(2.0), last: None };
        assert_eq!(q.reference_price(), Some(1.5));
    }

    #[test]
    fn reference_price_falls_back_to_single_side() {
        let q = OptionQuote { bid: Some(1.2), ask: None, last: Some(0.0) };
        assert_eq!(q.reference_price(), Some(1.2));
        let q = OptionQuote { bid: None, ask: None, last: None };
        assert_eq!(q.reference_price(), None);
    }
}
