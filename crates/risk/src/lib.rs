pub mod bubble;
pub mod metrics;
pub mod report;
pub mod stress;

pub use bubble::{score_bubble_risk, BubbleRiskScore, Regime};
pub use metrics::{
    beta, compute_risk_report, cvar, hhi, high_correlations, historical_var, max_drawdown, rsi,
    sharpe, sortino,
};
pub use report::RiskReport;
pub use stress::{default_scenarios, stress_pnl, StressScenario};
