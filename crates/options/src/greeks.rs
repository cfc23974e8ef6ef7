//! Analytic Greeks at a solved or supplied volatility.

use chrono::NaiveDate;
use folio_core::{Error, Greeks, OptionContract, OptionType, Result};

use crate::pricing::{self, d1_d2, norm_cdf, norm_pdf};

const DAYS_PER_YEAR: f64 = 365.0;

/// Volatility input: either already known, or a market price to invert.
#[derive(Debug, Clone, Copy)]
pub enum VolInput {
    Volatility(f64),
    MarketPrice(f64),
}

/// Year fraction from valuation date to expiry.
pub fn time_to_expiry(expiry: NaiveDate, valuation_date: NaiveDate) -> f64 {
    (expiry - valuation_date).num_days() as f64 / DAYS_PER_YEAR
}

/// Computes the full Greeks record for one contract at one spot, rate, and
/// valuation date. Nothing is cached: every call re-derives from inputs.
///
/// # Errors
///
/// Returns `UnsolvableVolatility` when the contract is expired, the spot
/// or supplied volatility is non-positive, or price inversion fails.
pub fn compute_greeks(
    contract: &OptionContract,
    spot: f64,
    rate: f64,
    valuation_date: NaiveDate,
    vol: VolInput,
) -> Result<Greeks> {
    let time = time_to_expiry(contract.expiry, valuation_date);
    if time <= 0.0 {
        return Err(Error::UnsolvableVolatility {
            reason: format!("contract expired {}", contract.expiry),
        });
    }
    if spot <= 0.0 {
        return Err(Error::UnsolvableVolatility {
            reason: format!("non-positive spot {spot}"),
        });
    }

    let iv = match vol {
        VolInput::Volatility(v) if v > 0.0 => v,
        VolInput::Volatility(v) => {
            return Err(Error::UnsolvableVolatility {
                reason: format!("non-positive volatility {v}"),
            })
        }
        VolInput::MarketPrice(p) => pricing::implied_volatility(
            contract.option_type,
            p,
            spot,
            contract.strike,
            time,
            rate,
        )?,
    };

    let strike = contract.strike;
    let (d1, d2) = d1_d2(spot, strike, time, rate, iv);
    let df = (-rate * time).exp();

    let delta = match contract.option_type {
        OptionType::Call => norm_cdf(d1),
        OptionType::Put => norm_cdf(d1) - 1.0,
    };
    let gamma = norm_pdf(d1) / (spot * iv * time.sqrt());
    let common_decay = -spot * norm_pdf(d1) * iv / (2.0 * time.sqrt());
    let theta_annual = match contract.option_type {
        OptionType::Call => common_decay - rate * strike * df * norm_cdf(d2),
        OptionType::Put => common_decay + rate * strike * df * norm_cdf(-d2),
    };
    let vega = spot * norm_pdf(d1) * time.sqrt();

    Ok(Greeks {
        delta,
        gamma,
        theta: theta_annual / DAYS_PER_YEAR,
        vega: vega / 100.0,
        implied_volatility: iv,
    })
}

/// Finds the strike whose call delta matches `target_delta`, by bisection
/// (call delta is monotone decreasing in strike). Used to select the
/// strike band for a delta-targeted signal.
///
/// # Errors
///
/// Returns `InvalidConfiguration` for a target outside (0, 1) or
/// `UnsolvableVolatility` when inputs are degenerate.
pub fn strike_for_delta(
    target_delta: f64,
    spot: f64,
    time: f64,
    rate: f64,
    vol: f64,
) -> Result<f64> {
    if !(0.0 < target_delta && target_delta < 1.0) {
        return Err(Error::InvalidConfiguration(format!(
            "target delta must be within (0, 1): {target_delta}"
        )));
    }
    if !(spot > 0.0 && time > 0.0 && vol > 0.0) {
        return Err(Error::UnsolvableVolatility {
            reason: format!("degenerate inputs: spot={spot} time={time} vol={vol}"),
        });
    }

    let call_delta = |strike: f64| {
        let (d1, _) = d1_d2(spot, strike, time, rate, vol);
        norm_cdf(d1)
    };

    let mut lo = spot * 0.01;
    let mut hi = spot * 4.0;
    for _ in 0..80 {
        let mid = (lo + hi) / 2.0;
        if call_delta(mid) > target_delta {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok((lo + hi) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn contract(option_type: OptionType, strike: f64) -> OptionContract {
        OptionContract {
            underlying: "TQQQ".to_string(),
            expiry: NaiveDate::from_ymd_opt(2026, 6, 18).unwrap(),
            strike,
            option_type,
            last_price: None,
            open_interest: None,
        }
    }

    fn valuation() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 14).unwrap()
    }

    #[test]
    fn call_delta_within_unit_interval() {
        let g = compute_greeks(
            &contract(OptionType::Call, 62.0),
            60.0,
            0.045,
            valuation(),
            VolInput::Volatility(0.5),
        )
        .unwrap();
        assert!(g.delta > 0.0 && g.delta < 1.0);
        assert!(g.gamma > 0.0);
        assert!(g.vega > 0.0);
        assert!(g.theta < 0.0);
    }

    #[test]
    fn put_delta_is_negative() {
        let g = compute_greeks(
            &contract(OptionType::Put, 58.0),
            60.0,
            0.045,
            valuation(),
            VolInput::Volatility(0.5),
        )
        .unwrap();
        assert!(g.delta < 0.0 && g.delta > -1.0);
    }

    #[test]
    fn greeks_from_market_price_solve_iv_first() {
        let c = contract(OptionType::Call, 62.0);
        let time = time_to_expiry(c.expiry, valuation());
        let p = pricing::price(OptionType::Call, 60.0, 62.0, time, 0.045, 0.42);
        let g = compute_greeks(&c, 60.0, 0.045, valuation(), VolInput::MarketPrice(p)).unwrap();
        assert!((g.implied_volatility - 0.42).abs() < 1e-4);
    }

    #[test]
    fn non_positive_spot_is_unsolvable() {
        let c = contract(OptionType::Call, 62.0);
        for spot in [0.0, -60.0] {
            let err = compute_greeks(&c, spot, 0.045, valuation(), VolInput::Volatility(0.5));
            assert!(
                matches!(err, Err(Error::UnsolvableVolatility { .. })),
                "spot {spot} must not yield NaN greeks"
            );
        }
    }

    #[test]
    fn expired_contract_is_unsolvable() {
        let c = contract(OptionType::Call, 62.0);
        let late = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert!(compute_greeks(&c, 60.0, 0.045, late, VolInput::Volatility(0.5)).is_err());
    }

    #[test]
    fn strike_for_delta_round_trips() {
        let time = 35.0 / 365.0;
        let strike = strike_for_delta(0.25, 60.0, time, 0.045, 0.5).unwrap();
        assert!(strike > 60.0, "a 0.25-delta call sits above spot: {strike}");
        let (d1, _) = d1_d2(60.0, strike, time, 0.045, 0.5);
        assert!((norm_cdf(d1) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn strike_for_delta_rejects_bad_target() {
        assert!(strike_for_delta(0.0, 60.0, 0.1, 0.045, 0.5).is_err());
        assert!(strike_for_delta(1.0, 60.0, 0.1, 0.045, 0.5).is_err());
    }
}
