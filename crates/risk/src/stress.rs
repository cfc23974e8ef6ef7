//! Named historical shock scenarios applied to current positions.

use folio_core::{Portfolio, RiskConfig};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single historical shock expressed as a broad-market percentage move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressScenario {
    pub name: String,
    pub market_move: f64,
}

/// Default scenario table. Moves are broad-market; leveraged positions are
/// scaled by their stated leverage factor.
pub fn default_scenarios() -> Vec<StressScenario> {
    [
        ("COVID crash (Mar 2020)", -0.34),
        ("2022 bear market", -0.25),
        ("Flash crash (Aug 2015)", -0.09),
        ("Rate shock", -0.12),
    ]
    .into_iter()
    .map(|(name, market_move)| StressScenario {
        name: name.to_string(),
        market_move,
    })
    .collect()
}

/// Portfolio P&L per scenario: each position moves by the market shock
/// times its leverage factor.
pub fn stress_pnl(
    portfolio: &Portfolio,
    scenarios: &[StressScenario],
    config: &RiskConfig,
) -> Vec<(String, f64)> {
    scenarios
        .iter()
        .map(|scenario| {
            let pnl: f64 = portfolio
                .positions
                .iter()
                .map(|p| {
                    let mv = p.market_value().to_f64().unwrap_or(0.0);
                    mv * scenario.market_move * config.leverage_for(&p.symbol)
                })
                .sum();
            let net = portfolio.net_assets().to_f64().unwrap_or(0.0);
            if net > 0.0 && pnl / net < -0.25 {
                warn!(
                    scenario = %scenario.name,
                    pnl,
                    pct = pnl / net,
                    "stress scenario breaches quarter of net assets"
                );
            }
            (scenario.name.clone(), pnl)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Position;
    use rust_decimal_macros::dec;

    fn portfolio() -> Portfolio {
        Portfolio::new(
            vec![
                Position {
                    symbol: "TQQQ".to_string(),
                    quantity: dec!(100),
                    avg_cost: dec!(50),
                    current_price: dec!(60),
                },
                Position {
                    symbol: "AAPL".to_string(),
                    quantity: dec!(10),
                    avg_cost: dec!(180),
                    current_price: dec!(200),
                },
            ],
            dec!(1000),
        )
    }

    #[test]
    fn leveraged_positions_scale_by_factor() {
        let config = RiskConfig::default();
        let scenarios = vec![StressScenario {
            name: "down 10".to_string(),
            market_move: -0.10,
        }];
        let pnl = stress_pnl(&portfolio(), &scenarios, &config);
        // TQQQ: 6000 * -0.10 * 3 = -1800; AAPL: 2000 * -0.10 = -200
        assert!((pnl[0].1 - (-2000.0)).abs() < 1e-9);
    }

    #[test]
    fn default_table_is_all_downside() {
        assert!(default_scenarios().iter().all(|s| s.market_move < 0.0));
    }
}
