//! Portfolio risk metrics over price and position history.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use folio_core::{
    annualized_vol, std_dev, Portfolio, PriceSeries, RiskConfig, TRADING_DAYS_PER_YEAR,
};
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::report::RiskReport;
use crate::stress::{default_scenarios, stress_pnl};

/// Covariance-based beta. `None` when the paired history is shorter than
/// 20 observations or the benchmark shows no variance.
pub fn beta(asset: &[f64], benchmark: &[f64]) -> Option<f64> {
    let n = asset.len().min(benchmark.len());
    if n < 20 {
        return None;
    }
    let (a, b) = (&asset[asset.len() - n..], &benchmark[benchmark.len() - n..]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    let cov = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n as f64 - 1.0);
    let var_b = b.iter().map(|y| (y - mean_b).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    if var_b <= f64::EPSILON {
        return None;
    }
    Some(cov / var_b)
}

/// Annualized Sharpe ratio over daily returns.
pub fn sharpe(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    if returns.len() < 20 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let vol = std_dev(returns)? * TRADING_DAYS_PER_YEAR.sqrt();
    if vol <= f64::EPSILON {
        return None;
    }
    Some((mean * TRADING_DAYS_PER_YEAR - risk_free_rate) / vol)
}

/// Sortino ratio: excess return over downside deviation. Downside
/// deviation uses only negative-return periods.
pub fn sortino(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    if returns.len() < 20 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let dd = std_dev(&downside)? * TRADING_DAYS_PER_YEAR.sqrt();
    if dd <= f64::EPSILON {
        return None;
    }
    Some((mean * TRADING_DAYS_PER_YEAR - risk_free_rate) / dd)
}

/// Historical-simulation quantile of the return distribution. No
/// normality assumption: sort and index.
pub fn historical_var(returns: &[f64], confidence: f64, min_history: usize) -> Option<f64> {
    if returns.len() < min_history.max(2) {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

/// Mean of returns at or beyond the VaR quantile.
pub fn cvar(returns: &[f64], confidence: f64, min_history: usize) -> Option<f64> {
    let var = historical_var(returns, confidence, min_history)?;
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    if tail.is_empty() {
        return None;
    }
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Largest peak-to-trough decline of the equity curve implied by daily
/// returns, tracked by a running peak. Negative or zero.
pub fn max_drawdown(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut equity = 1.0;
    let mut peak = 1.0;
    let mut worst = 0.0_f64;
    for r in returns {
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        }
        worst = worst.min((equity - peak) / peak);
    }
    Some(worst)
}

/// Herfindahl-Hirschman concentration: sum of squared weights.
pub fn hhi(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

/// Wilder-smoothed relative strength index over the trailing closes.
/// `None` below `period + 1` closes. All-gain history reads 100, a flat
/// history reads the neutral 50.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period < 2 || closes.len() < period + 1 {
        return None;
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let seed = &deltas[..period];
    let mut avg_gain = seed.iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = seed.iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;
    for d in &deltas[period..] {
        avg_gain = (avg_gain * (period as f64 - 1.0) + d.max(0.0)) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + (-d).max(0.0)) / period as f64;
    }
    if avg_loss <= f64::EPSILON {
        return Some(if avg_gain <= f64::EPSILON { 50.0 } else { 100.0 });
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len();
    if n < 2 || n != b.len() {
        return None;
    }
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a <= f64::EPSILON || var_b <= f64::EPSILON {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Symbol pairs whose return correlation exceeds `threshold` in absolute
/// value, strongest first, capped at five. Returns are aligned pairwise on
/// common dates.
pub fn high_correlations(
    series: &[PriceSeries],
    threshold: f64,
) -> Vec<(String, String, f64)> {
    let by_symbol: Vec<(&str, BTreeMap<NaiveDate, f64>)> = series
        .iter()
        .map(|s| (s.symbol(), returns_by_date(s)))
        .collect();

    let mut pairs = Vec::new();
    for i in 0..by_symbol.len() {
        for (sym_b, returns_b) in &by_symbol[i + 1..] {
            let (sym_a, returns_a) = &by_symbol[i];
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for (date, r) in returns_a {
                if let Some(other) = returns_b.get(date) {
                    xs.push(*r);
                    ys.push(*other);
                }
            }
            if let Some(corr) = pearson(&xs, &ys) {
                if corr.abs() > threshold {
                    pairs.push((sym_a.to_string(), sym_b.to_string(), corr));
                }
            }
        }
    }
    pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
    pairs.truncate(5);
    pairs
}

fn returns_by_date(series: &PriceSeries) -> BTreeMap<NaiveDate, f64> {
    series
        .points()
        .windows(2)
        .filter(|w| w[0].1 > 0.0)
        .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
        .collect()
}

/// Daily portfolio returns as the signed-weight sum of constituent
/// returns. Symbols without history that day contribute zero; symbols
/// with no usable series at all are reported back to the caller.
fn portfolio_returns(
    portfolio: &Portfolio,
    series: &[PriceSeries],
) -> (Vec<(NaiveDate, f64)>, Vec<String>) {
    let by_symbol: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| (s.symbol(), returns_by_date(s)))
        .collect();

    let gross: f64 = portfolio
        .positions
        .iter()
        .map(|p| p.market_value().abs().to_f64().unwrap_or(0.0))
        .sum();
    if gross <= 0.0 {
        return (Vec::new(), Vec::new());
    }

    let mut missing = Vec::new();
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    for p in &portfolio.positions {
        match by_symbol.get(p.symbol.as_str()) {
            Some(rets) if rets.len() >= 2 => dates.extend(rets.keys()),
            _ => missing.push(p.symbol.clone()),
        }
    }

    let returns = dates
        .into_iter()
        .map(|d| {
            let r = portfolio
                .positions
                .iter()
                .filter_map(|p| {
                    let w = p.market_value().to_f64()? / gross;
                    let r = by_symbol.get(p.symbol.as_str())?.get(&d)?;
                    Some(w * r)
                })
                .sum();
            (d, r)
        })
        .collect();
    (returns, missing)
}

/// Assembles the full risk report. Metric-level shortfalls degrade the
/// single field to `None`; nothing here fails the whole report.
pub fn compute_risk_report(
    portfolio: &Portfolio,
    series: &[PriceSeries],
    benchmark: &PriceSeries,
    config: &RiskConfig,
) -> RiskReport {
    let (dated_returns, missing_series) = portfolio_returns(portfolio, series);
    let returns: Vec<f64> = dated_returns.iter().map(|(_, r)| *r).collect();

    let bench_by_date = returns_by_date(benchmark);
    let mut paired_asset = Vec::new();
    let mut paired_bench = Vec::new();
    for (d, r) in &dated_returns {
        if let Some(b) = bench_by_date.get(d) {
            paired_asset.push(*r);
            paired_bench.push(*b);
        }
    }

    let weights: Vec<f64> = portfolio.weights().into_iter().map(|(_, w)| w).collect();

    debug!(
        observations = returns.len(),
        paired = paired_asset.len(),
        missing = missing_series.len(),
        "computing risk report"
    );

    RiskReport {
        volatility_short: annualized_vol(&returns, config.short_vol_window),
        volatility_long: annualized_vol(&returns, config.long_vol_window),
        beta: beta(&paired_asset, &paired_bench),
        sharpe: sharpe(&returns, config.risk_free_rate),
        sortino: sortino(&returns, config.risk_free_rate),
        var_95: historical_var(&returns, 0.95, config.var_min_history),
        var_99: historical_var(&returns, 0.99, config.var_min_history),
        cvar_95: cvar(&returns, 0.95, config.var_min_history),
        max_drawdown: max_drawdown(&returns),
        hhi: hhi(&weights),
        rsi: series
            .iter()
            .filter_map(|s| {
                rsi(&s.closes(), config.rsi_period).map(|v| (s.symbol().to_string(), v))
            })
            .collect(),
        high_correlations: high_correlations(series, config.correlation_threshold),
        stress_pnl: stress_pnl(portfolio, &default_scenarios(), config),
        missing_series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Position;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i64::from(n))
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| (day(i as u32), *c))
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    /// Deterministic oscillating walk long enough for VaR.
    fn wavy_closes(n: usize) -> Vec<f64> {
        let mut closes = Vec::with_capacity(n);
        let mut price = 100.0;
        for i in 0..n {
            let swing = ((i * 7 + 3) % 13) as f64 / 13.0 - 0.5;
            price *= 1.0 + swing * 0.04;
            closes.push(price);
        }
        closes
    }

    fn single_position_portfolio(symbol: &str, price: Decimal) -> Portfolio {
        Portfolio::new(
            vec![Position {
                symbol: symbol.to_string(),
                quantity: dec!(100),
                avg_cost: price,
                current_price: price,
            }],
            dec!(5000),
        )
    }

    #[test]
    fn constant_prices_give_zero_vol_and_drawdown() {
        let closes = vec![100.0; 300];
        let portfolio = single_position_portfolio("FLAT", dec!(100));
        let report = compute_risk_report(
            &portfolio,
            &[series("FLAT", &closes)],
            &series("SPY", &closes),
            &RiskConfig::default(),
        );
        assert_eq!(report.volatility_short, Some(0.0));
        assert_eq!(report.volatility_long, Some(0.0));
        assert_eq!(report.max_drawdown, Some(0.0));
        // Benchmark variance is zero, so beta is honestly absent.
        assert_eq!(report.beta, None);
        assert_eq!(report.sharpe, None);
    }

    #[test]
    fn var_quantiles_are_ordered() {
        let closes = wavy_closes(300);
        let returns: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        let v95 = historical_var(&returns, 0.95, 252).unwrap();
        let v99 = historical_var(&returns, 0.99, 252).unwrap();
        let c95 = cvar(&returns, 0.95, 252).unwrap();
        assert!(v99 <= v95);
        assert!(v95 <= 0.0);
        assert!(c95 <= v99);
    }

    #[test]
    fn var_degrades_below_min_history() {
        let returns = vec![0.01, -0.02, 0.005];
        assert_eq!(historical_var(&returns, 0.95, 252), None);
    }

    #[test]
    fn beta_of_identical_series_is_one() {
        let closes = wavy_closes(100);
        let returns: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        let b = beta(&returns, &returns).unwrap();
        assert!((b - 1.0).abs() < 1e-9);
    }

    #[test]
    fn beta_none_when_benchmark_flat() {
        let asset: Vec<f64> = (0..30).map(|i| (i % 3) as f64 * 0.01 - 0.01).collect();
        let flat = vec![0.0; 30];
        assert_eq!(beta(&asset, &flat), None);
    }

    #[test]
    fn max_drawdown_tracks_running_peak() {
        // 100 -> 120 -> 90 -> 130: worst decline 25% from 120 to 90.
        let returns = vec![0.2, -0.25, 130.0 / 90.0 - 1.0];
        let dd = max_drawdown(&returns).unwrap();
        assert!((dd - (-0.25)).abs() < 1e-9);
    }

    #[test]
    fn hhi_single_position_is_one() {
        assert!((hhi(&[1.0]) - 1.0).abs() < 1e-12);
        assert!((hhi(&[0.5, 0.5]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sortino_uses_downside_only() {
        let mut returns = vec![0.01; 40];
        returns.extend([-0.02, -0.01, -0.03, -0.02, -0.015]);
        let s = sortino(&returns, 0.0).unwrap();
        let sh = sharpe(&returns, 0.0).unwrap();
        // Downside deviation is computed on a narrower set than total vol,
        // so the two ratios must differ.
        assert!((s - sh).abs() > 1e-9);
    }

    #[test]
    fn rsi_hits_bounds_on_one_sided_series() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&rising, 14), Some(100.0));

        let falling: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let r = rsi(&falling, 14).unwrap();
        assert!(r < 1.0, "all-loss series reads near zero: {r}");

        let flat = vec![100.0; 30];
        assert_eq!(rsi(&flat, 14), Some(50.0));
    }

    #[test]
    fn rsi_degrades_below_period() {
        let closes = vec![100.0, 101.0, 102.0];
        assert_eq!(rsi(&closes, 14), None);
    }

    #[test]
    fn rsi_of_mixed_series_sits_between_bounds() {
        let closes = wavy_closes(60);
        let r = rsi(&closes, 14).unwrap();
        assert!(r > 0.0 && r < 100.0);
    }

    #[test]
    fn correlated_pairs_are_reported_strongest_first() {
        let closes = wavy_closes(100);
        let scaled: Vec<f64> = closes.iter().map(|c| c * 2.0).collect();
        let inverse: Vec<f64> = closes.iter().map(|c| 1.0e6 / c).collect();

        let pairs = high_correlations(
            &[
                series("A", &closes),
                series("B", &scaled),
                series("C", &inverse),
            ],
            0.7,
        );
        // A/B share identical returns; A/C and B/C move opposite.
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].0, "A");
        assert_eq!(pairs[0].1, "B");
        assert!((pairs[0].2 - 1.0).abs() < 1e-9);
        assert!(pairs[1].2 < -0.7);
    }

    #[test]
    fn uncorrelated_pairs_are_excluded() {
        // Period-2 vs period-4 oscillations have near-zero correlation.
        let a: Vec<f64> = (0..80)
            .scan(100.0_f64, |p, i| {
                *p *= if i % 2 == 0 { 1.01 } else { 0.99 };
                Some(*p)
            })
            .collect();
        let b: Vec<f64> = (0..80)
            .scan(100.0_f64, |p, i| {
                *p *= if i % 4 < 2 { 1.01 } else { 0.99 };
                Some(*p)
            })
            .collect();
        let pairs = high_correlations(&[series("A", &a), series("B", &b)], 0.7);
        assert!(pairs.is_empty());
    }

    #[test]
    fn report_carries_rsi_and_correlation_pairs() {
        let closes = wavy_closes(300);
        let scaled: Vec<f64> = closes.iter().map(|c| c * 3.0).collect();
        let portfolio = Portfolio::new(
            vec![
                Position {
                    symbol: "A".to_string(),
                    quantity: dec!(10),
                    avg_cost: dec!(100),
                    current_price: dec!(100),
                },
                Position {
                    symbol: "B".to_string(),
                    quantity: dec!(10),
                    avg_cost: dec!(100),
                    current_price: dec!(100),
                },
            ],
            dec!(0),
        );
        let report = compute_risk_report(
            &portfolio,
            &[series("A", &closes), series("B", &scaled)],
            &series("SPY", &closes),
            &RiskConfig::default(),
        );
        assert_eq!(report.rsi.len(), 2);
        assert!(report.rsi.iter().all(|(_, v)| (0.0..=100.0).contains(v)));
        assert_eq!(report.high_correlations.len(), 1);
        assert_eq!(report.high_correlations[0].0, "A");
    }

    #[test]
    fn missing_series_is_reported_not_fatal() {
        let closes = wavy_closes(300);
        let portfolio = Portfolio::new(
            vec![
                Position {
                    symbol: "KNOWN".to_string(),
                    quantity: dec!(10),
                    avg_cost: dec!(100),
                    current_price: dec!(100),
                },
                Position {
                    symbol: "GHOST".to_string(),
                    quantity: dec!(10),
                    avg_cost: dec!(100),
                    current_price: dec!(100),
                },
            ],
            dec!(0),
        );
        let report = compute_risk_report(
            &portfolio,
            &[series("KNOWN", &closes)],
            &series("SPY", &closes),
            &RiskConfig::default(),
        );
        assert_eq!(report.missing_series, vec!["GHOST".to_string()]);
        assert!(report.volatility_short.is_some());
    }
}
