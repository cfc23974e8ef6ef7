//! Engine configuration. Every recognized field is enumerated with its
//! default and validated at construction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub bubble: BubbleConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.risk.validate()?;
        self.bubble.validate()?;
        self.strategy.validate()?;
        self.monitor.validate()
    }
}

/// Risk-report parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Annualized risk-free rate used for Sharpe/Sortino.
    pub risk_free_rate: f64,
    pub short_vol_window: usize,
    pub long_vol_window: usize,
    /// Minimum return observations for the VaR/CVaR quantiles.
    pub var_min_history: usize,
    /// Wilder smoothing period for the per-symbol RSI.
    pub rsi_period: usize,
    /// Absolute return correlation above which a pair is reported.
    pub correlation_threshold: f64,
    /// Leverage factors for leveraged ETFs, applied when stress scenarios
    /// scale position exposure.
    pub leverage_factors: Vec<(String, f64)>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            short_vol_window: 20,
            long_vol_window: 60,
            var_min_history: 252,
            rsi_period: 14,
            correlation_threshold: 0.7,
            leverage_factors: vec![
                ("TQQQ".to_string(), 3.0),
                ("SQQQ".to_string(), -3.0),
                ("UPRO".to_string(), 3.0),
                ("QLD".to_string(), 2.0),
                ("SSO".to_string(), 2.0),
            ],
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(Error::InvalidConfiguration(format!(
                "risk_free_rate must be in [0, 1): {}",
                self.risk_free_rate
            )));
        }
        if self.short_vol_window < 2 || self.long_vol_window <= self.short_vol_window {
            return Err(Error::InvalidConfiguration(
                "vol windows must satisfy 2 <= short < long".to_string(),
            ));
        }
        if self.rsi_period < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "rsi_period must be at least 2: {}",
                self.rsi_period
            )));
        }
        if !(0.0 < self.correlation_threshold && self.correlation_threshold < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "correlation_threshold must be within (0, 1): {}",
                self.correlation_threshold
            )));
        }
        Ok(())
    }

    pub fn leverage_for(&self, symbol: &str) -> f64 {
        self.leverage_factors
            .iter()
            .find(|(s, _)| s == symbol)
            .map_or(1.0, |(_, f)| *f)
    }
}

/// Bubble-risk calibration. The breakpoint tables are empirical calibration
/// artifacts, not structural invariants; keep them configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BubbleConfig {
    pub sma_window: usize,
    pub trend_window: usize,
    pub vol_window: usize,
    /// (lower bound on SMA deviation, score); picks the last row whose
    /// bound is <= the observed value. Scores must stay within [0, 40].
    pub sma_breakpoints: Vec<(f64, f64)>,
    /// (lower bound on fitted curvature, score) in [0, 30].
    pub trend_breakpoints: Vec<(f64, f64)>,
    /// (lower bound on annualized vol, score) in [0, 30].
    pub vol_breakpoints: Vec<(f64, f64)>,
    /// Regime cut points: moderate / elevated / high.
    pub regime_cuts: (f64, f64, f64),
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            sma_window: 200,
            trend_window: 60,
            vol_window: 30,
            sma_breakpoints: vec![
                (0.0, 5.0),
                (0.05, 14.0),
                (0.10, 22.0),
                (0.15, 30.0),
                (0.20, 36.0),
                (0.25, 40.0),
            ],
            trend_breakpoints: vec![
                (0.0, 6.0),
                (0.01, 12.0),
                (0.03, 20.0),
                (0.06, 26.0),
                (0.10, 30.0),
            ],
            vol_breakpoints: vec![
                (0.15, 8.0),
                (0.22, 15.0),
                (0.30, 22.0),
                (0.40, 30.0),
            ],
            regime_cuts: (40.0, 55.0, 66.0),
        }
    }
}

impl BubbleConfig {
    pub fn validate(&self) -> Result<()> {
        let (m, e, h) = self.regime_cuts;
        if !(0.0 < m && m < e && e < h && h <= 100.0) {
            return Err(Error::InvalidConfiguration(format!(
                "regime cuts must be ascending within (0, 100]: {m}/{e}/{h}"
            )));
        }
        for (name, table, cap) in [
            ("sma", &self.sma_breakpoints, 40.0),
            ("trend", &self.trend_breakpoints, 30.0),
            ("vol", &self.vol_breakpoints, 30.0),
        ] {
            if table.windows(2).any(|w| w[1].0 <= w[0].0) {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} breakpoints must have ascending bounds"
                )));
            }
            if table.iter().any(|(_, s)| *s < 0.0 || *s > cap) {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} breakpoint scores must stay within [0, {cap}]"
                )));
            }
        }
        Ok(())
    }
}

/// Covered-call / sell-put rule parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Bubble score at or above which the call rule fires.
    pub risk_threshold: f64,
    /// Score at or above which the elevated delta tier applies.
    pub elevated_threshold: f64,
    pub delta_normal: f64,
    pub delta_elevated: f64,
    /// Sell-put rule fires only below this score (inverse condition; never
    /// shares the call threshold).
    pub put_threshold: f64,
    pub put_delta: f64,
    pub target_dte: i64,
    pub roll_dte: i64,
    /// Buy back when premium decays to this fraction of the open credit.
    pub profit_target_pct: f64,
    /// Close when premium expands to this multiple of the open credit.
    pub stop_loss_pct: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 66.0,
            elevated_threshold: 80.0,
            delta_normal: 0.25,
            delta_elevated: 0.30,
            put_threshold: 40.0,
            put_delta: 0.25,
            target_dte: 35,
            roll_dte: 14,
            profit_target_pct: 0.50,
            stop_loss_pct: 2.00,
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("risk_threshold", self.risk_threshold),
            ("elevated_threshold", self.elevated_threshold),
            ("put_threshold", self.put_threshold),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} must be within [0, 100]: {v}"
                )));
            }
        }
        if self.elevated_threshold < self.risk_threshold {
            return Err(Error::InvalidConfiguration(
                "elevated_threshold must be >= risk_threshold".to_string(),
            ));
        }
        if self.put_threshold >= self.risk_threshold {
            return Err(Error::InvalidConfiguration(
                "put_threshold must sit below risk_threshold".to_string(),
            ));
        }
        for (name, d) in [
            ("delta_normal", self.delta_normal),
            ("delta_elevated", self.delta_elevated),
            ("put_delta", self.put_delta),
        ] {
            if !(0.0 < d && d < 1.0) {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} must be within (0, 1): {d}"
                )));
            }
        }
        if self.target_dte <= 0 || self.roll_dte < 0 || self.roll_dte >= self.target_dte {
            return Err(Error::InvalidConfiguration(
                "require 0 <= roll_dte < target_dte".to_string(),
            ));
        }
        Ok(())
    }
}

/// Buyback monitor parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub state_path: String,
    /// Hysteresis band: re-arm only after price recovers above
    /// trigger * (1 + default_reset_pct).
    pub default_reset_pct: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            state_path: "data/buyback_state.json".to_string(),
            default_reset_pct: 0.20,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_reset_pct < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "default_reset_pct must be non-negative: {}",
                self.default_reset_pct
            )));
        }
        Ok(())
    }
}

/// Maps a value through a breakpoint table: score of the last row whose
/// lower bound is <= value, 0.0 when the value sits below every bound.
pub fn breakpoint_score(table: &[(f64, f64)], value: f64) -> f64 {
    table
        .iter()
        .take_while(|(bound, _)| value >= *bound)
        .last()
        .map_or(0.0, |(_, score)| *score)
}
