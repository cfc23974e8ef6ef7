//! Drives the scorer and strategy rules over historical daily closes and
//! simulates the covered-call cash flow for every parameter combination.
//!
//! Look-ahead is treated as a correctness bug: every date's decision is
//! computed on the history up to and including that date, and nothing here reads a
//! clock or draws randomness, so identical inputs reproduce bit-identical
//! results.

use chrono::NaiveDate;
use folio_core::{
    annualized_vol, BubbleConfig, Error, OptionType, PriceSeries, Result, StrategyConfig,
    TRADING_DAYS_PER_YEAR,
};
use folio_options::{price, strike_for_delta};
use folio_risk::{score_bubble_risk, BubbleRiskScore};
use folio_strategy::{evaluate_covered_call, Action};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{BacktestResult, ParameterGrid};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub risk_free_rate: f64,
    /// Trading days each simulated covered call stays open.
    pub holding_days: usize,
    /// Trailing window for the realized vol used to price the call.
    pub vol_window: usize,
    /// History required before the first decision date.
    pub warmup: usize,
    pub bubble: BubbleConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            holding_days: 25,
            vol_window: 30,
            warmup: 200,
            bubble: BubbleConfig::default(),
        }
    }
}

/// Benchmark and underlying closes joined on their common dates.
struct AlignedHistory {
    dates: Vec<NaiveDate>,
    benchmark: PriceSeries,
    underlying_closes: Vec<f64>,
}

fn align(benchmark: &PriceSeries, underlying: &PriceSeries) -> Result<AlignedHistory> {
    let mut dates = Vec::new();
    let mut bench_points = Vec::new();
    let mut under_closes = Vec::new();

    let mut under_iter = underlying.points().iter().peekable();
    for (date, close) in benchmark.points() {
        while under_iter.peek().is_some_and(|(d, _)| d < date) {
            under_iter.next();
        }
        if let Some((d, u)) = under_iter.peek() {
            if d == date {
                dates.push(*date);
                bench_points.push((*date, *close));
                under_closes.push(*u);
            }
        }
    }

    Ok(AlignedHistory {
        dates,
        benchmark: PriceSeries::new(benchmark.symbol(), bench_points)?,
        underlying_closes: under_closes,
    })
}

struct Simulation {
    trades: usize,
    wins: usize,
    assigned: usize,
    strategy_equity: f64,
    buy_hold_equity: f64,
}

fn simulate(
    strategy_config: &StrategyConfig,
    scores: &[BubbleRiskScore],
    underlying_closes: &[f64],
    underlying_log_returns: &[f64],
    ticker: &str,
    config: &BacktestConfig,
) -> Simulation {
    let target_delta = strategy_config.delta_normal;
    let n = underlying_closes.len();
    let mut sim = Simulation {
        trades: 0,
        wins: 0,
        assigned: 0,
        strategy_equity: 1.0,
        buy_hold_equity: 1.0,
    };

    let mut i = config.warmup;
    while i + 1 < n {
        let signal = evaluate_covered_call(&scores[i - config.warmup], ticker, strategy_config);

        if signal.action == Action::SellCall {
            let j = (i + config.holding_days).min(n - 1);
            let spot = underlying_closes[i];
            let close = underlying_closes[j];
            let time = (j - i) as f64 / TRADING_DAYS_PER_YEAR;
            let vol = annualized_vol(&underlying_log_returns[..i], config.vol_window)
                .filter(|v| *v > 1e-6);

            if let Some(vol) = vol {
                if let Ok(strike) =
                    strike_for_delta(target_delta, spot, time, config.risk_free_rate, vol)
                {
                    let premium = price(
                        OptionType::Call,
                        spot,
                        strike,
                        time,
                        config.risk_free_rate,
                        vol,
                    );
                    let window_return = close / spot - 1.0;
                    let capped_return = window_return.min(strike / spot - 1.0);
                    let assigned = close > strike;
                    // Premium kept, minus the upside surrendered on assignment.
                    let pnl_per_share = premium + if assigned { strike - close } else { 0.0 };

                    sim.trades += 1;
                    if pnl_per_share > 0.0 {
                        sim.wins += 1;
                    }
                    if assigned {
                        sim.assigned += 1;
                    }
                    sim.strategy_equity *= 1.0 + capped_return + premium / spot;
                    sim.buy_hold_equity *= 1.0 + window_return;

                    debug!(
                        threshold = strategy_config.risk_threshold,
                        target_delta,
                        day = i,
                        strike,
                        premium,
                        assigned,
                        "simulated covered call"
                    );

                    i = j;
                    continue;
                }
            }
        }

        // No position opened: both books hold the shares for one day.
        let daily = underlying_closes[i + 1] / underlying_closes[i] - 1.0;
        sim.strategy_equity *= 1.0 + daily;
        sim.buy_hold_equity *= 1.0 + daily;
        i += 1;
    }

    sim
}

fn annualize(equity: f64, span_days: usize) -> f64 {
    if span_days == 0 || equity <= 0.0 {
        return 0.0;
    }
    equity.powf(TRADING_DAYS_PER_YEAR / span_days as f64) - 1.0
}

/// Sweeps the grid over aligned history. The benchmark drives the bubble
/// score; the underlying is the covered-call book. Results come back in
/// grid order, one per combination.
///
/// # Errors
///
/// Returns `InvalidConfiguration` for a malformed grid and
/// `InsufficientHistory` when the aligned history cannot cover warmup
/// plus one holding period.
pub fn run_backtest(
    benchmark: &PriceSeries,
    underlying: &PriceSeries,
    grid: &ParameterGrid,
    config: &BacktestConfig,
) -> Result<Vec<BacktestResult>> {
    grid.validate()?;

    let history = align(benchmark, underlying)?;
    let n = history.dates.len();
    let required = config.warmup + config.holding_days + 1;
    if n < required {
        return Err(Error::InsufficientHistory {
            required,
            actual: n,
        });
    }

    // Scores depend only on the benchmark prefix, not on the grid, so
    // compute each date's score once from its strict prefix.
    let scores: Vec<BubbleRiskScore> = (config.warmup..n)
        .map(|i| {
            let prefix = history.benchmark.truncated(history.dates[i]);
            score_bubble_risk(&prefix, &config.bubble)
        })
        .collect();

    // Index k holds the return into day k + 1, keeping the vector aligned
    // with the close vector so prefix slices stay prefix-only.
    let log_returns: Vec<f64> = history
        .underlying_closes
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 && w[1] > 0.0 {
                (w[1] / w[0]).ln()
            } else {
                0.0
            }
        })
        .collect();

    let span_days = n - 1 - config.warmup;
    let ticker = underlying.symbol().to_string();

    let combinations = grid.combinations();
    let mut results = Vec::with_capacity(combinations.len());
    for (threshold, target_delta) in combinations {
        // Each grid point runs under a fully validated rule config; the
        // put gate is derived below the swept threshold so the config's
        // own invariants hold at any grid value.
        let strategy_config = StrategyConfig {
            risk_threshold: threshold,
            elevated_threshold: threshold.max(StrategyConfig::default().elevated_threshold),
            delta_normal: target_delta,
            delta_elevated: target_delta,
            put_threshold: threshold / 2.0,
            ..Default::default()
        };
        strategy_config.validate()?;

        let sim = simulate(
            &strategy_config,
            &scores,
            &history.underlying_closes,
            &log_returns,
            &ticker,
            config,
        );
        let trades = sim.trades;
        results.push(BacktestResult {
            threshold,
            target_delta,
            trades,
            win_rate: if trades > 0 {
                sim.wins as f64 / trades as f64
            } else {
                0.0
            },
            assignment_rate: if trades > 0 {
                sim.assigned as f64 / trades as f64
            } else {
                0.0
            },
            annualized_excess_return: annualize(sim.strategy_equity, span_days)
                - annualize(sim.buy_hold_equity, span_days),
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(i64::from(n))
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| (day(i as u32), *c))
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    /// Steep compounding run-up with a deterministic wobble: keeps the
    /// bubble score hot and realized vol positive.
    fn runup(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let wobble = 1.0 + 0.008 * (((i % 5) as f64) - 2.0) / 2.0;
                100.0 * 1.01_f64.powi(i as i32) * wobble
            })
            .collect()
    }

    fn grid() -> ParameterGrid {
        ParameterGrid {
            thresholds: vec![66.0],
            target_deltas: vec![0.25],
        }
    }

    #[test]
    fn hot_market_produces_trades() {
        let closes = runup(320);
        let results = run_backtest(
            &series("QQQ", &closes),
            &series("TQQQ", &closes),
            &grid(),
            &BacktestConfig::default(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert!(r.trades > 0, "expected trades in a parabolic run-up");
        assert!((0.0..=1.0).contains(&r.win_rate));
        assert!((0.0..=1.0).contains(&r.assignment_rate));
        assert!(r.annualized_excess_return.is_finite());
    }

    #[test]
    fn calm_market_produces_no_trades() {
        let closes: Vec<f64> = (0..320)
            .map(|i| 100.0 + 0.02 * (((i % 7) as f64) - 3.0))
            .collect();
        let results = run_backtest(
            &series("QQQ", &closes),
            &series("QQQ", &closes),
            &grid(),
            &BacktestConfig::default(),
        )
        .unwrap();
        assert_eq!(results[0].trades, 0);
        assert_eq!(results[0].win_rate, 0.0);
    }

    #[test]
    fn results_are_bit_identical_across_runs() {
        let closes = runup(320);
        let benchmark = series("QQQ", &closes);
        let underlying = series("TQQQ", &closes);
        let grid = ParameterGrid {
            thresholds: vec![55.0, 66.0],
            target_deltas: vec![0.20, 0.30],
        };
        let config = BacktestConfig::default();

        let a = run_backtest(&benchmark, &underlying, &grid, &config).unwrap();
        let b = run_backtest(&benchmark, &underlying, &grid, &config).unwrap();

        let ser_a = serde_json::to_string(&a).unwrap();
        let ser_b = serde_json::to_string(&b).unwrap();
        assert_eq!(ser_a, ser_b);
    }

    #[test]
    fn result_order_follows_grid_order() {
        let closes = runup(320);
        let grid = ParameterGrid {
            thresholds: vec![55.0, 66.0],
            target_deltas: vec![0.20, 0.30],
        };
        let results = run_backtest(
            &series("QQQ", &closes),
            &series("TQQQ", &closes),
            &grid,
            &BacktestConfig::default(),
        )
        .unwrap();
        let combos: Vec<(f64, f64)> = results
            .iter()
            .map(|r| (r.threshold, r.target_delta))
            .collect();
        assert_eq!(combos, grid.combinations());
    }

    #[test]
    fn threshold_below_default_put_gate_still_runs() {
        let closes = runup(320);
        let grid = ParameterGrid {
            thresholds: vec![30.0],
            target_deltas: vec![0.25],
        };
        let results = run_backtest(
            &series("QQQ", &closes),
            &series("TQQQ", &closes),
            &grid,
            &BacktestConfig::default(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn zero_threshold_is_rejected_as_invalid() {
        let closes = runup(320);
        let grid = ParameterGrid {
            thresholds: vec![0.0],
            target_deltas: vec![0.25],
        };
        let err = run_backtest(
            &series("QQQ", &closes),
            &series("QQQ", &closes),
            &grid,
            &BacktestConfig::default(),
        );
        assert!(matches!(err, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn short_history_is_rejected() {
        let closes = runup(100);
        let err = run_backtest(
            &series("QQQ", &closes),
            &series("QQQ", &closes),
            &grid(),
            &BacktestConfig::default(),
        );
        assert!(matches!(err, Err(Error::InsufficientHistory { .. })));
    }

    #[test]
    fn misaligned_dates_are_dropped_not_fatal() {
        let closes = runup(330);
        let benchmark = series("QQQ", &closes);
        // Underlying misses the first ten dates.
        let under_points: Vec<(NaiveDate, f64)> = closes
            .iter()
            .enumerate()
            .skip(10)
            .map(|(i, c)| (day(i as u32), *c))
            .collect();
        let underlying = PriceSeries::new("TQQQ", under_points).unwrap();

        let results = run_backtest(&benchmark, &underlying, &grid(), &BacktestConfig::default());
        assert!(results.is_ok());
    }
}
