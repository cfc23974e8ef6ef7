//! Closed-form European option pricing and the implied-volatility solver.

use folio_core::{Error, OptionType, Result};
use std::f64::consts::PI;

const IV_MAX_ITERATIONS: u32 = 100;
const IV_PRICE_TOLERANCE: f64 = 1e-6;
const IV_MIN: f64 = 0.001;
const IV_MAX: f64 = 5.0;

/// Abramowitz & Stegun 7.1.26, max error < 1.5e-7.
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

pub(crate) fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / 2.0_f64.sqrt()))
}

pub(crate) fn norm_pdf(x: f64) -> f64 {
    (-(x * x) / 2.0).exp() / (2.0 * PI).sqrt()
}

pub(crate) fn d1_d2(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> (f64, f64) {
    let d1 = ((spot / strike).ln() + (rate + vol * vol / 2.0) * time) / (vol * time.sqrt());
    (d1, d1 - vol * time.sqrt())
}

/// Black-Scholes price. At or past expiry this collapses to intrinsic value.
pub fn price(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    vol: f64,
) -> f64 {
    if time <= 0.0 {
        return match option_type {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        };
    }
    let (d1, d2) = d1_d2(spot, strike, time, rate, vol);
    let df = (-rate * time).exp();
    match option_type {
        OptionType::Call => spot * norm_cdf(d1) - strike * df * norm_cdf(d2),
        OptionType::Put => strike * df * norm_cdf(-d2) - spot * norm_cdf(-d1),
    }
}

/// No-arbitrage bounds for a European option.
fn price_bounds(option_type: OptionType, spot: f64, strike: f64, time: f64, rate: f64) -> (f64, f64) {
    let df = (-rate * time).exp();
    match option_type {
        OptionType::Call => ((spot - strike * df).max(0.0), spot),
        OptionType::Put => ((strike * df - spot).max(0.0), strike * df),
    }
}

/// Solves for the volatility that reproduces `market_price` via Newton
/// iteration on vega, with the vol clamped to [0.001, 5.0].
///
/// # Errors
///
/// Returns `UnsolvableVolatility` when inputs are degenerate, the price
/// sits outside no-arbitrage bounds, or the iteration fails to converge.
pub fn implied_volatility(
    option_type: OptionType,
    market_price: f64,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
) -> Result<f64> {
    if !(market_price > 0.0 && spot > 0.0 && strike > 0.0 && time > 0.0) {
        return Err(Error::UnsolvableVolatility {
            reason: format!(
                "degenerate inputs: price={market_price} spot={spot} strike={strike} time={time}"
            ),
        });
    }

    let (lower, upper) = price_bounds(option_type, spot, strike, time, rate);
    if market_price < lower || market_price > upper {
        return Err(Error::UnsolvableVolatility {
            reason: format!(
                "price {market_price:.4} outside no-arbitrage bounds [{lower:.4}, {upper:.4}]"
            ),
        });
    }

    let mut vol = 0.20;
    for _ in 0..IV_MAX_ITERATIONS {
        let model = price(option_type, spot, strike, time, rate, vol);
        let diff = model - market_price;
        if diff.abs() < IV_PRICE_TOLERANCE {
            return Ok(vol);
        }

        let (d1, _) = d1_d2(spot, strike, time, rate, vol);
        let vega = spot * time.sqrt() * norm_pdf(d1);
        if vega.abs() < 1e-10 {
            return Err(Error::UnsolvableVolatility {
                reason: "vanishing vega".to_string(),
            });
        }

        vol = (vol - diff / vega).clamp(IV_MIN, IV_MAX);
    }

    Err(Error::UnsolvableVolatility {
        reason: format!("no convergence after {IV_MAX_ITERATIONS} iterations"),
    })
}
