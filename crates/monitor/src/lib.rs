pub mod buyback;
pub mod store;

pub use buyback::{check_buyback, BuybackTarget, Phase, TargetState};
pub use store::BuybackStateStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use folio_core::OptionQuote;

/// One monitoring pass for one target: load, advance the state machine,
/// persist — all inside a single read-modify-write unit. Returns whether
/// a buy signal fired on this observation.
pub fn observe(
    store: &BuybackStateStore,
    quote: &OptionQuote,
    target: &BuybackTarget,
    now: DateTime<Utc>,
) -> Result<bool> {
    let mut fired = false;
    store.update(&target.name, |prev| {
        let current = prev
            .cloned()
            .unwrap_or_else(|| TargetState::armed(now));
        let (triggered, next) = check_buyback(quote, target, &current, now);
        fired = triggered;
        next
    })?;
    Ok(fired)
}
