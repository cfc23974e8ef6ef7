//! Signal types produced by the strategy rules. Ephemeral: produced per
//! evaluation, never persisted by the engine.

use folio_risk::Regime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SellCall,
    SellPut,
    Hold,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SellCall => write!(f, "sell_call"),
            Self::SellPut => write!(f, "sell_put"),
            Self::Hold => write!(f, "hold"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySignal {
    pub ticker: String,
    pub action: Action,
    /// Delta band to prefer when selecting a contract; `None` on hold.
    /// The rule never picks an exact contract — that stays with the
    /// caller's chain lookup.
    pub target_delta: Option<f64>,
    pub bubble_risk_score: f64,
    pub regime: Regime,
    /// How far past the gate the score sits, in [0, 1].
    pub strength: f64,
    pub rationale: String,
}
