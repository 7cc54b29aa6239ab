//! Events published to subscribers after every tick or control operation.

use minebank_accrual::{Accrual, WithheldReason};
use minebank_types::{Amount, Unit};

/// What changed. Subscribers format these for display; nothing here is pre-rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccrualEvent {
    /// Whole intervals were credited.
    Accrued(Accrual),
    /// Intervals were due but not credited; they stay owed.
    Withheld {
        intervals: u64,
        reason: WithheldReason,
    },
    /// Accrual was switched on or off.
    Toggled { enabled: bool },
    /// Routing or target unit changed.
    RoutingChanged { auto_credit: bool, target_unit: Unit },
    /// Per-interval rate changed.
    RateChanged { rate: Amount },
    /// Mining payout address changed.
    WalletAddressChanged { address: String },
    /// An admin overwrote a unit's address or balance.
    UnitWalletUpdated {
        unit: Unit,
        address: String,
        balance: Amount,
    },
    /// The store was wiped and defaults restored.
    Reset,
}
