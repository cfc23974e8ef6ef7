//! Positions and portfolios as delivered by broker adapters.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single holding. Negative quantity means short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub current_price: Decimal,
}

impl Position {
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.current_price
    }
}

/// Positions (unique by symbol) plus a cash balance. The engines never
/// mutate a portfolio; it is owned by the caller for one analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub positions: Vec<Position>,
    pub cash: Decimal,
}

impl Portfolio {
    pub fn new(positions: Vec<Position>, cash: Decimal) -> Self {
        Self { positions, cash }
    }

    /// Cash plus the sum of position market values.
    pub fn net_assets(&self) -> Decimal {
        self.cash + self.positions.iter().map(Position::market_value).sum::<Decimal>()
    }

    /// Absolute market-value weights per symbol. Cash is excluded from the
    /// denominator so concentration reads on invested capital only.
    pub fn weights(&self) -> Vec<(String, f64)> {
        let gross: Decimal = self
            .positions
            .iter()
            .map(|p| p.market_value().abs())
            .sum();
        if gross.is_zero() {
            return Vec::new();
        }
        self.positions
            .iter()
            .map(|p| {
                let w = (p.market_value().abs() / gross).to_f64().unwrap_or(0.0);
                (p.symbol.clone(), w)
            })
            .collect()
    }
}
