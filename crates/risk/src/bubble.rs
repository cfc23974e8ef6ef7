//! Composite market-regime score over a broad-market price series.
//!
//! Three sub-scores — SMA deviation, trend acceleration, volatility
//! regime — summed into a 0..100 composite and bucketed into a regime.
//! The breakpoint tables live on `BubbleConfig`; they are calibration
//! artifacts, not invariants.

use folio_core::{annualized_vol, breakpoint_score, BubbleConfig, PriceSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Low,
    Moderate,
    Elevated,
    High,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Moderate => write!(f, "moderate"),
            Self::Elevated => write!(f, "elevated"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BubbleRiskScore {
    /// In [0, 40].
    pub sma_deviation_score: f64,
    /// In [0, 30].
    pub trend_acceleration_score: f64,
    /// In [0, 30].
    pub volatility_regime_score: f64,
    /// Sum of the three, in [0, 100].
    pub total: f64,
    pub regime: Regime,
    /// True when history was too short and the neutral score was used.
    pub degraded: bool,
}

fn regime_for(total: f64, config: &BubbleConfig) -> Regime {
    let (moderate, elevated, high) = config.regime_cuts;
    if total >= high {
        Regime::High
    } else if total >= elevated {
        Regime::Elevated
    } else if total >= moderate {
        Regime::Moderate
    } else {
        Regime::Low
    }
}

/// Neutral mid-scale score, used when history is too short to compute the
/// sub-scores locally. Degrades instead of failing the caller.
fn neutral_score(config: &BubbleConfig) -> BubbleRiskScore {
    let total = 50.0;
    BubbleRiskScore {
        sma_deviation_score: 20.0,
        trend_acceleration_score: 15.0,
        volatility_regime_score: 15.0,
        total,
        regime: regime_for(total, config),
        degraded: true,
    }
}

/// Percentage deviation of the latest close from its trailing SMA.
fn sma_deviation(series: &PriceSeries, window: usize) -> f64 {
    let Some(sma) = series.sma(window) else {
        return 0.0;
    };
    let Some((_, latest)) = series.latest() else {
        return 0.0;
    };
    if sma <= 0.0 {
        return 0.0;
    }
    (latest - sma) / sma
}

/// Second derivative of a quadratic least-squares fit over the trailing
/// window, with x normalized to [0, 1] and prices to the window's first
/// close. Positive curvature means a parabolic run-up.
fn trend_acceleration(series: &PriceSeries, window: usize) -> f64 {
    let closes = series.closes();
    if closes.len() < window || window < 3 {
        return 0.0;
    }
    let tail = &closes[closes.len() - window..];
    let base = tail[0];
    if base <= 0.0 {
        return 0.0;
    }

    let n = window as f64;
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
    for (i, price) in tail.iter().enumerate() {
        let x = i as f64 / (n - 1.0);
        let y = price / base;
        let x2 = x * x;
        s1 += x;
        s2 += x2;
        s3 += x2 * x;
        s4 += x2 * x2;
        t0 += y;
        t1 += x * y;
        t2 += x2 * y;
    }

    // Cramer's rule on the 3x3 normal equations for y = a*x^2 + b*x + c.
    let det = |m: [[f64; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let d = det([[s4, s3, s2], [s3, s2, s1], [s2, s1, n]]);
    if d.abs() < 1e-12 {
        return 0.0;
    }
    let a = det([[t2, s3, s2], [t1, s2, s1], [t0, s1, n]]) / d;
    2.0 * a
}

/// Scores bubble risk from the series alone. With fewer than the SMA
/// window's points the neutral score is returned instead of an error, so
/// an unavailable composite source never fails the caller.
pub fn score_bubble_risk(series: &PriceSeries, config: &BubbleConfig) -> BubbleRiskScore {
    if series.len() < config.sma_window {
        debug!(
            len = series.len(),
            required = config.sma_window,
            "bubble score degraded to neutral"
        );
        return neutral_score(config);
    }

    let deviation = sma_deviation(series, config.sma_window);
    let curvature = trend_acceleration(series, config.trend_window);
    let log_returns = series.log_returns();
    let realized_vol = annualized_vol(&log_returns, config.vol_window).unwrap_or(0.0);

    let sma_score = breakpoint_score(&config.sma_breakpoints, deviation).clamp(0.0, 40.0);
    let trend_score = breakpoint_score(&config.trend_breakpoints, curvature).clamp(0.0, 30.0);
    let vol_score = breakpoint_score(&config.vol_breakpoints, realized_vol).clamp(0.0, 30.0);
    let total = sma_score + trend_score + vol_score;

    BubbleRiskScore {
        sma_deviation_score: sma_score,
        trend_acceleration_score: trend_score,
        volatility_regime_score: vol_score,
        total,
        regime: regime_for(total, config),
        degraded: false,
    }
}
