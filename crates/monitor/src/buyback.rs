//! Buyback trigger state machine.
//!
//! armed -> (ref <= trigger_price) -> triggered, emitting one buy signal.
//! The target stays triggered while price sits below the hysteresis band
//! and re-arms only once ref recovers above trigger * (1 + reset_pct), so
//! a quote oscillating at the threshold cannot flap alerts.

use chrono::{DateTime, NaiveDate, Utc};
use folio_core::{OptionQuote, OptionType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A configured buyback level for one contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuybackTarget {
    pub name: String,
    pub underlying: String,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub option_type: OptionType,
    /// Trigger when the reference price falls to or below this.
    pub trigger_price: f64,
    /// Contracts to buy back when triggered.
    pub quantity: u32,
    /// Hysteresis band width for re-arming.
    pub reset_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Armed,
    Triggered,
}

/// Persisted per-target record. This is the only on-disk shape the core
/// owns; it survives process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetState {
    pub phase: Phase,
    pub last_price: Option<f64>,
    pub trigger_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl TargetState {
    pub fn armed(now: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Armed,
            last_price: None,
            trigger_count: 0,
            updated_at: now,
        }
    }
}

/// Advances the state machine for one quote observation. Returns whether
/// a buy signal fires now plus the successor state. Pure: persistence is
/// the caller's (store's) concern.
pub fn check_buyback(
    quote: &OptionQuote,
    target: &BuybackTarget,
    state: &TargetState,
    now: DateTime<Utc>,
) -> (bool, TargetState) {
    let Some(reference) = quote.reference_price() else {
        // No usable quote: leave the record untouched.
        return (false, state.clone());
    };

    let mut next = state.clone();
    next.last_price = Some(reference);
    next.updated_at = now;

    match state.phase {
        Phase::Armed if reference <= target.trigger_price => {
            next.phase = Phase::Triggered;
            next.trigger_count += 1;
            warn!(
                target = %target.name,
                reference,
                trigger = target.trigger_price,
                quantity = target.quantity,
                "buyback triggered"
            );
            (true, next)
        }
        Phase::Armed => (false, next),
        Phase::Triggered => {
            let reset_level = target.trigger_price * (1.0 + target.reset_pct);
            if reference > reset_level {
                next.phase = Phase::Armed;
                debug!(target = %target.name, reference, reset_level, "buyback re-armed");
            }
            // Repeated observations below the trigger never re-emit.
            (false, next)
        }
    }
}
