//! Cash-secured put rule, keyed on the inverse condition of the call
//! rule: puts are sold into calm regimes only. Deliberately independent
//! of the covered-call threshold.

use folio_core::StrategyConfig;
use folio_risk::BubbleRiskScore;
use tracing::debug;

use crate::signal::{Action, StrategySignal};

pub fn evaluate_sell_put(
    score: &BubbleRiskScore,
    ticker: &str,
    config: &StrategyConfig,
) -> StrategySignal {
    let total = score.total;

    let signal = if total < config.put_threshold {
        StrategySignal {
            ticker: ticker.to_string(),
            action: Action::SellPut,
            target_delta: Some(config.put_delta),
            bubble_risk_score: total,
            regime: score.regime,
            strength: ((config.put_threshold - total) / config.put_threshold).clamp(0.0, 1.0),
            rationale: format!(
                "Score {total:.1} below {:.0}; sell cash-secured puts at delta {:.2}",
                config.put_threshold, config.put_delta
            ),
        }
    } else {
        StrategySignal {
            ticker: ticker.to_string(),
            action: Action::Hold,
            target_delta: None,
            bubble_risk_score: total,
            regime: score.regime,
            strength: 0.0,
            rationale: format!(
                "Score {total:.1} at or above {:.0}; no put exposure",
                config.put_threshold
            ),
        }
    };

    debug!(ticker, action = %signal.action, score = total, "sell put rule");
    signal
}
