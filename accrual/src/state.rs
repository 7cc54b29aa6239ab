//! Persisted accrual state and the per-unit balances it can credit.

use minebank_types::{AccrualParams, Amount, Timestamp, Unit, ACCRUAL_INTERVAL_SECS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accrual configuration plus the flat balance and the time accrual was applied through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualState {
    /// Whether accrual is active.
    pub enabled: bool,

    /// Accrual has been applied through this instant. Only ever advanced by
    /// whole intervals, so the remainder since then is still owed.
    pub last_update: Timestamp,

    /// Amount accrued per whole interval, in flat currency.
    pub rate_per_interval: Amount,

    /// Receives accrual when `auto_credit` is off.
    pub flat_balance: Amount,

    /// Route accrual to `target_unit` instead of `flat_balance`.
    pub auto_credit: bool,

    pub target_unit: Unit,

    /// Mining payout address; empty when unset.
    pub wallet_address: String,
}

impl AccrualState {
    pub fn new(params: &AccrualParams, now: Timestamp) -> Self {
        Self {
            enabled: params.enabled,
            last_update: now,
            rate_per_interval: params.rate_per_interval,
            flat_balance: params.flat_balance,
            auto_credit: params.auto_credit,
            target_unit: params.target_unit,
            wallet_address: String::new(),
        }
    }

    /// Whole intervals elapsed between `last_update` and `now` (zero on clock regression).
    pub fn whole_intervals(&self, now: Timestamp) -> u64 {
        self.last_update.elapsed_since(now) / ACCRUAL_INTERVAL_SECS
    }

    /// When the next interval boundary falls.
    pub fn next_accrual_at(&self) -> Option<Timestamp> {
        self.last_update.checked_add_secs(ACCRUAL_INTERVAL_SECS)
    }

    /// Seconds until the next accrual can apply; zero if one is already due.
    /// `None` while accrual is disabled.
    pub fn seconds_until_next_accrual(&self, now: Timestamp) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        let next = self.next_accrual_at()?;
        Some(next.as_secs().saturating_sub(now.as_secs()))
    }
}

/// One unit's sub-balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitBalance {
    pub address: String,
    pub balance: Amount,
}

/// The unit sub-balances, keyed by unit.
///
/// Normally holds all ten units. An entry can go missing if the store is
/// edited externally; the engine then withholds credit rather than invent one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitBalances {
    entries: BTreeMap<Unit, UnitBalance>,
}

impl UnitBalances {
    /// No entries at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A zero balance with no address for every unit.
    pub fn with_all_units() -> Self {
        Self {
            entries: Unit::ALL
                .into_iter()
                .map(|unit| (unit, UnitBalance::default()))
                .collect(),
        }
    }

    pub fn get(&self, unit: Unit) -> Option<&UnitBalance> {
        self.entries.get(&unit)
    }

    pub fn get_mut(&mut self, unit: Unit) -> Option<&mut UnitBalance> {
        self.entries.get_mut(&unit)
    }

    pub fn contains(&self, unit: Unit) -> bool {
        self.entries.contains_key(&unit)
    }

    pub fn insert(&mut self, unit: Unit, balance: UnitBalance) -> Option<UnitBalance> {
        self.entries.insert(unit, balance)
    }

    /// The entry for `unit`, created with a zero balance if missing.
    pub fn get_or_insert_default(&mut self, unit: Unit) -> &mut UnitBalance {
        self.entries.entry(unit).or_default()
    }

    pub fn remove(&mut self, unit: Unit) -> Option<UnitBalance> {
        self.entries.remove(&unit)
    }

    /// Balance of `unit`, zero when untracked.
    pub fn balance_of(&self, unit: Unit) -> Amount {
        self.get(unit).map(|b| b.balance).unwrap_or(Amount::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Unit, &UnitBalance)> {
        self.entries.iter().map(|(unit, balance)| (*unit, balance))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
