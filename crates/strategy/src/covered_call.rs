//! Covered-call rule: sell calls only when the bubble-risk regime is hot.

use folio_core::StrategyConfig;
use folio_risk::BubbleRiskScore;
use tracing::debug;

use crate::signal::{Action, StrategySignal};

/// Evaluates the covered-call rule for one ticker. Stateless and
/// deterministic: identical inputs always produce the identical signal.
///
/// The rule is intentionally asymmetric — it never recommends closing or
/// selling puts; see `sell_put` for the inverse-keyed parallel rule.
pub fn evaluate_covered_call(
    score: &BubbleRiskScore,
    ticker: &str,
    config: &StrategyConfig,
) -> StrategySignal {
    let total = score.total;

    let signal = if total >= config.elevated_threshold {
        StrategySignal {
            ticker: ticker.to_string(),
            action: Action::SellCall,
            target_delta: Some(config.delta_elevated),
            bubble_risk_score: total,
            regime: score.regime,
            strength: strength(total, config.risk_threshold),
            rationale: format!(
                "Elevated risk: score {total:.1} >= {:.0}; sell {}d calls at delta {:.2}",
                config.elevated_threshold, config.target_dte, config.delta_elevated
            ),
        }
    } else if total >= config.risk_threshold {
        StrategySignal {
            ticker: ticker.to_string(),
            action: Action::SellCall,
            target_delta: Some(config.delta_normal),
            bubble_risk_score: total,
            regime: score.regime,
            strength: strength(total, config.risk_threshold),
            rationale: format!(
                "Score {total:.1} >= {:.0}; sell {}d calls at delta {:.2}",
                config.risk_threshold, config.target_dte, config.delta_normal
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
                "Score {total:.1} below {:.0}; hold shares uncovered",
                config.risk_threshold
            ),
        }
    };

    debug!(ticker, action = %signal.action, score = total, "covered call rule");
    signal
}

/// Same rule applied across a ticker list, order preserved.
pub fn evaluate_covered_calls(
    score: &BubbleRiskScore,
    tickers: &[&str],
    config: &StrategyConfig,
) -> Vec<StrategySignal> {
    tickers
        .iter()
        .map(|t| evaluate_covered_call(score, t, config))
        .collect()
}

fn strength(total: f64, threshold: f64) -> f64 {
    if threshold >= 100.0 {
        return 1.0;
    }
    ((total - threshold) / (100.0 - threshold)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_score;
    use folio_risk::Regime;

    #[test]
    fn high_regime_sells_calls() {
        let signal = evaluate_covered_call(
            &make_score(70.0, Regime::High),
            "TQQQ",
            &StrategyConfig::default(),
        );
        assert_eq!(signal.action, Action::SellCall);
        assert_eq!(signal.target_delta, Some(0.25));
    }

    #[test]
    fn moderate_regime_holds() {
        let signal = evaluate_covered_call(
            &make_score(50.0, Regime::Moderate),
            "TQQQ",
            &StrategyConfig::default(),
        );
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(signal.target_delta, None);
        assert_eq!(signal.strength, 0.0);
    }

    #[test]
    fn elevated_tier_raises_delta() {
        let signal = evaluate_covered_call(
            &make_score(85.0, Regime::High),
            "TQQQ",
            &StrategyConfig::default(),
        );
        assert_eq!(signal.action, Action::SellCall);
        assert_eq!(signal.target_delta, Some(0.30));
        assert!(signal.rationale.contains("Elevated risk"));
    }

    #[test]
    fn strength_caps_at_one() {
        let signal = evaluate_covered_call(
            &make_score(100.0, Regime::High),
            "TQQQ",
            &StrategyConfig::default(),
        );
        assert!(signal.strength <= 1.0);
    }

    #[test]
    fn custom_threshold_moves_the_gate() {
        let config = StrategyConfig {
            risk_threshold: 50.0,
            put_threshold: 30.0,
            delta_normal: 0.20,
            ..Default::default()
        };
        let signal = evaluate_covered_call(&make_score(55.0, Regime::Elevated), "QQQ", &config);
        assert_eq!(signal.action, Action::SellCall);
        assert_eq!(signal.target_delta, Some(0.20));
    }

    #[test]
    fn multi_ticker_preserves_order() {
        let signals = evaluate_covered_calls(
            &make_score(70.0, Regime::High),
            &["TQQQ", "QQQ", "SPY"],
            &StrategyConfig::default(),
        );
        let tickers: Vec<&str> = signals.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["TQQQ", "QQQ", "SPY"]);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let score = make_score(70.0, Regime::High);
        let config = StrategyConfig::default();
        let a = evaluate_covered_call(&score, "TQQQ", &config);
        let b = evaluate_covered_call(&score, "TQQQ", &config);
        assert_eq!(a.target_delta, b.target_delta);
        assert_eq!(a.rationale, b.rationale);
    }
}
