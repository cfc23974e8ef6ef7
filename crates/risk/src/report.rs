//! The computed risk snapshot. `None` always means "insufficient data",
//! never zero — misreporting a metric is worse than omitting it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Annualized volatility over the short window (default 20d).
    pub volatility_short: Option<f64>,
    /// Annualized volatility over the long window (default 60d).
    pub volatility_long: Option<f64>,
    /// Beta vs the benchmark series.
    pub beta: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    /// Historical-simulation daily return quantiles (negative = loss).
    pub var_95: Option<f64>,
    pub var_99: Option<f64>,
    /// Mean return at or beyond the 95% quantile.
    pub cvar_95: Option<f64>,
    /// Largest peak-to-trough decline of the equity curve (negative).
    pub max_drawdown: Option<f64>,
    /// Herfindahl-Hirschman concentration over absolute weights, cash
    /// excluded. Always computable.
    pub hhi: f64,
    /// Wilder RSI per symbol; symbols with too little history are absent.
    pub rsi: Vec<(String, f64)>,
    /// Symbol pairs whose return correlation exceeds the configured
    /// threshold in absolute value, strongest first. Concentration risk
    /// the single-name weights cannot see.
    pub high_correlations: Vec<(String, String, f64)>,
    /// Per-scenario stress P&L in currency units.
    pub stress_pnl: Vec<(String, f64)>,
    /// Symbols whose price history was missing or too short; their
    /// contribution to return-based metrics is simply absent.
    pub missing_series: Vec<String>,
}
