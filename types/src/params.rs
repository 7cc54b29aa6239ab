//! Accrual parameters and their defaults.

use crate::amount::{Amount, AMOUNT_SCALE};
use crate::unit::Unit;

/// Length of one accrual interval: five minutes.
pub const ACCRUAL_INTERVAL_SECS: u64 = 300;

/// Initial values for a freshly created accrual store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccrualParams {
    /// Whether accrual starts enabled.
    pub enabled: bool,
    /// Amount accrued per whole interval, in flat currency.
    pub rate_per_interval: Amount,
    /// Opening flat balance.
    pub flat_balance: Amount,
    /// Whether accrual is routed to a unit balance instead of the flat balance.
    pub auto_credit: bool,
    /// Unit receiving converted accrual when `auto_credit` is set.
    pub target_unit: Unit,
}

impl Default for AccrualParams {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_per_interval: Amount::new(AMOUNT_SCALE / 2),
            flat_balance: Amount::from_whole(100),
            auto_credit: true,
            target_unit: Unit::Btc,
        }
    }
}
