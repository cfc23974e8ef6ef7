//! Chain snapshots: one Greeks record per contract across an expiry.

use chrono::NaiveDate;
use folio_core::{Greeks, OptionContract, OptionType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::greeks::{compute_greeks, VolInput};

/// Which side(s) of the chain to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainSide {
    Calls,
    Puts,
    Both,
}

impl ChainSide {
    fn includes(self, option_type: OptionType) -> bool {
        match self {
            Self::Calls => option_type == OptionType::Call,
            Self::Puts => option_type == OptionType::Put,
            Self::Both => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    pub contract: OptionContract,
    pub greeks: Greeks,
}

/// Builds a snapshot for one expiry: one entry per strike and included
/// side, ordered by strike ascending, truncated to `limit` when given.
/// Contracts whose volatility cannot be solved are skipped, not fatal.
pub fn chain_snapshot(
    underlying: &str,
    expiry: NaiveDate,
    strikes: &[f64],
    side: ChainSide,
    limit: Option<usize>,
    spot: f64,
    rate: f64,
    valuation_date: NaiveDate,
    vol: f64,
) -> Vec<ChainEntry> {
    let mut sorted = strikes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();

    let mut entries = Vec::new();
    for strike in sorted {
        for option_type in [OptionType::Call, OptionType::Put] {
            if !side.includes(option_type) {
                continue;
            }
            let contract = OptionContract {
                underlying: underlying.to_string(),
                expiry,
                strike,
                option_type,
                last_price: None,
                open_interest: None,
            };
            match compute_greeks(&contract, spot, rate, valuation_date, VolInput::Volatility(vol)) {
                Ok(greeks) => entries.push(ChainEntry { contract, greeks }),
                Err(err) => {
                    debug!(underlying, strike, %option_type, %err, "skipping chain entry");
                }
            }
            if let Some(limit) = limit {
                if entries.len() >= limit {
                    return entries;
                }
            }
        }
    }
    entries
}
