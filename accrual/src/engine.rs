//! Core accrual engine.

use crate::error::AccrualError;
use crate::result::{Accrual, AccrualResult, CreditTarget, NoOpReason, WithheldReason};
use crate::state::{AccrualState, UnitBalance, UnitBalances};
use minebank_store::{AccrualSnapshot, AccrualStore, StoreError, StoredAccrual};
use minebank_types::{AccrualParams, Amount, Timestamp, Unit, ACCRUAL_INTERVAL_SECS};

/// On-disk layout version written by [`AccrualEngine::save_to_store`].
pub const SCHEMA_VERSION: u32 = 1;

/// The accrual engine. Counts elapsed intervals, credits them, and owns the
/// state they are credited to.
///
/// Callers must serialize access: `tick` is a read-modify-write of
/// `last_update`, and two interleaved ticks would credit the same window twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccrualEngine {
    state: AccrualState,
    balances: UnitBalances,
}

impl AccrualEngine {
    /// Fresh engine with default balances for every unit.
    pub fn new(params: &AccrualParams, now: Timestamp) -> Self {
        Self {
            state: AccrualState::new(params, now),
            balances: UnitBalances::with_all_units(),
        }
    }

    pub fn from_parts(state: AccrualState, balances: UnitBalances) -> Self {
        Self { state, balances }
    }

    pub fn state(&self) -> &AccrualState {
        &self.state
    }

    pub fn unit_balances(&self) -> &UnitBalances {
        &self.balances
    }

    /// Apply every whole interval elapsed since `last_update`.
    ///
    /// `last_update` advances by exactly `intervals × 300` seconds, never to
    /// `now`, so the sub-interval remainder is counted by a later tick.
    pub fn tick(&mut self, now: Timestamp) -> AccrualResult {
        let state = &mut self.state;
        if !state.enabled {
            return AccrualResult::NoOp(NoOpReason::Disabled);
        }
        if now < state.last_update {
            return AccrualResult::NoOp(NoOpReason::ClockRegression {
                behind_secs: now.elapsed_since(state.last_update),
            });
        }

        let intervals = state.whole_intervals(now);
        if intervals == 0 {
            return AccrualResult::NoOp(NoOpReason::BelowInterval {
                elapsed_secs: state.last_update.elapsed_since(now),
            });
        }

        let withheld = |reason| AccrualResult::Withheld { intervals, reason };

        let Some(gross) = state.rate_per_interval.checked_mul_count(intervals) else {
            return withheld(WithheldReason::Overflow);
        };
        // intervals × 300 ≤ elapsed, so this only fails on a corrupt timestamp.
        let Some(advanced) = state
            .last_update
            .checked_add_secs(intervals * ACCRUAL_INTERVAL_SECS)
        else {
            return withheld(WithheldReason::Overflow);
        };

        let (credited_to, credited_amount, new_balance) = if state.auto_credit {
            let unit = state.target_unit;
            let Some(entry) = self.balances.get_mut(unit) else {
                return withheld(WithheldReason::UnrecognizedTargetUnit(unit));
            };
            let Some(credited) = gross.checked_convert(unit.conversion_rate()) else {
                return withheld(WithheldReason::Overflow);
            };
            let Some(new_balance) = entry.balance.checked_add(credited) else {
                return withheld(WithheldReason::Overflow);
            };
            entry.balance = new_balance;
            (CreditTarget::Unit(unit), credited, new_balance)
        } else {
            let Some(new_balance) = state.flat_balance.checked_add(gross) else {
                return withheld(WithheldReason::Overflow);
            };
            state.flat_balance = new_balance;
            (CreditTarget::Flat, gross, new_balance)
        };

        state.last_update = advanced;

        AccrualResult::Applied(Accrual {
            intervals,
            gross,
            credited_to,
            credited_amount,
            new_balance,
            last_update: advanced,
        })
    }

    /// Turn accrual on or off.
    ///
    /// Whole intervals already due are settled first. The clock then restarts
    /// at `now`, so time spent disabled never accrues and any partial interval
    /// pending at the toggle is dropped. If the due intervals cannot be
    /// credited nothing changes, so they stay owed.
    pub fn set_enabled(&mut self, enabled: bool, now: Timestamp) -> Result<AccrualResult, AccrualError> {
        let settled = self.settle(now)?;
        self.state.enabled = enabled;
        self.state.last_update = now;
        Ok(settled)
    }

    pub fn set_wallet_address(&mut self, address: impl Into<String>) {
        self.state.wallet_address = address.into();
    }

    /// Switch routing between the flat balance and a unit balance,
    /// optionally changing the target unit.
    pub fn set_auto_credit(&mut self, enabled: bool, unit: Option<Unit>) -> Result<(), AccrualError> {
        if let Some(unit) = unit {
            self.ensure_tracked(unit)?;
            self.state.target_unit = unit;
        }
        self.state.auto_credit = enabled;
        Ok(())
    }

    /// Change the target unit by ticker symbol (case-insensitive).
    ///
    /// Unknown symbols are rejected here so that `tick` never meets one.
    pub fn set_target_unit(&mut self, symbol: &str) -> Result<Unit, AccrualError> {
        let unit: Unit = symbol
            .parse()
            .map_err(|_| AccrualError::UnknownUnit(symbol.to_string()))?;
        self.ensure_tracked(unit)?;
        self.state.target_unit = unit;
        Ok(unit)
    }

    /// Change the per-interval rate.
    ///
    /// Intervals that elapsed under the old rate are credited at the old rate
    /// first. If they cannot be credited the rate is left unchanged.
    pub fn set_rate(&mut self, rate: Amount, now: Timestamp) -> Result<AccrualResult, AccrualError> {
        let settled = self.settle(now)?;
        self.state.rate_per_interval = rate;
        Ok(settled)
    }

    /// Admin overwrite of one unit's address and/or balance.
    ///
    /// Creates the entry if it is missing, which is also how a store that lost
    /// its target unit is repaired.
    pub fn update_unit_wallet(
        &mut self,
        unit: Unit,
        address: Option<String>,
        balance: Option<Amount>,
    ) -> &UnitBalance {
        let entry = self.balances.get_or_insert_default(unit);
        if let Some(address) = address {
            entry.address = address;
        }
        if let Some(balance) = balance {
            entry.balance = balance;
        }
        entry
    }

    /// Tick, refusing if due intervals were withheld.
    fn settle(&mut self, now: Timestamp) -> Result<AccrualResult, AccrualError> {
        let settled = self.tick(now);
        if let AccrualResult::Withheld { reason, .. } = &settled {
            return Err(AccrualError::SettlementWithheld(reason.to_string()));
        }
        Ok(settled)
    }

    fn ensure_tracked(&self, unit: Unit) -> Result<(), AccrualError> {
        if self.balances.contains(unit) {
            Ok(())
        } else {
            Err(AccrualError::UnitNotTracked(unit))
        }
    }
}

impl AccrualEngine {
    /// Persist state, every unit balance and the schema version in one commit.
    pub fn save_to_store<S>(&self, store: &S) -> Result<(), AccrualError>
    where
        S: AccrualStore + ?Sized,
    {
        store.put_snapshot(self.encode()?)?;
        Ok(())
    }

    /// Restore engine state from a store.
    ///
    /// An empty store yields a fresh engine from `params` starting at `now`.
    /// Unit entries missing from a populated store stay missing.
    pub fn load_from_store<S>(store: &S, params: &AccrualParams, now: Timestamp) -> Result<Self, AccrualError>
    where
        S: AccrualStore + ?Sized,
    {
        Self::decode(store.load()?, params, now)
    }

    /// Load, apply `op`, and persist, all inside one exclusive store update.
    ///
    /// Nothing is written if `op` fails or leaves the engine unchanged, except
    /// that an empty store is always initialized. Returns the engine as
    /// persisted together with `op`'s value.
    pub fn update_in_store<S, T, E, F>(
        store: &S,
        params: &AccrualParams,
        now: Timestamp,
        op: F,
    ) -> Result<(Self, T), E>
    where
        S: AccrualStore + ?Sized,
        E: From<AccrualError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let mut op = Some(op);
        let mut outcome: Option<Result<(Self, T), E>> = None;

        store
            .update(&mut |stored: StoredAccrual| {
                let op = op.take()?;
                let fresh = stored.state.is_none();
                let mut engine = match Self::decode(stored, params, now) {
                    Ok(engine) => engine,
                    Err(e) => {
                        outcome = Some(Err(e.into()));
                        return None;
                    }
                };
                let before = engine.clone();
                let value = match op(&mut engine) {
                    Ok(value) => value,
                    Err(e) => {
                        outcome = Some(Err(e));
                        return None;
                    }
                };
                if !fresh && engine == before {
                    outcome = Some(Ok((engine, value)));
                    return None;
                }
                match engine.encode() {
                    Ok(snapshot) => {
                        outcome = Some(Ok((engine, value)));
                        Some(snapshot)
                    }
                    Err(e) => {
                        outcome = Some(Err(e.into()));
                        None
                    }
                }
            })
            .map_err(|e| E::from(AccrualError::Store(e)))?;

        outcome.unwrap_or_else(|| {
            Err(AccrualError::Store(StoreError::Backend("update callback did not run".into())).into())
        })
    }

    /// Wipe the store and start over from `params`.
    pub fn reset<S>(store: &S, params: &AccrualParams, now: Timestamp) -> Result<Self, AccrualError>
    where
        S: AccrualStore + ?Sized,
    {
        store.clear()?;
        let engine = Self::new(params, now);
        engine.save_to_store(store)?;
        Ok(engine)
    }

    fn encode(&self) -> Result<AccrualSnapshot, AccrualError> {
        let state =
            bincode::serialize(&self.state).map_err(|e| AccrualError::Serialization(e.to_string()))?;

        let mut units = Vec::with_capacity(self.balances.len());
        for (unit, balance) in self.balances.iter() {
            let bytes =
                bincode::serialize(balance).map_err(|e| AccrualError::Serialization(e.to_string()))?;
            units.push((unit.symbol().to_string(), bytes));
        }

        Ok(AccrualSnapshot {
            state,
            units,
            schema_version: SCHEMA_VERSION,
        })
    }

    fn decode(stored: StoredAccrual, params: &AccrualParams, now: Timestamp) -> Result<Self, AccrualError> {
        if let Some(found) = stored.schema_version {
            if found > SCHEMA_VERSION {
                return Err(AccrualError::SchemaMismatch {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
        }

        let state: AccrualState = match stored.state {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| AccrualError::Serialization(e.to_string()))?,
            None => return Ok(Self::new(params, now)),
        };

        let mut balances = UnitBalances::empty();
        for (symbol, bytes) in stored.units {
            let unit: Unit = symbol
                .parse()
                .map_err(|_| AccrualError::Serialization(format!("unknown unit key {symbol:?}")))?;
            let balance: UnitBalance = bincode::deserialize(&bytes)
                .map_err(|e| AccrualError::Serialization(e.to_string()))?;
            balances.insert(unit, balance);
        }

        Ok(Self { state, balances })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minebank_nullables::NullStore;
    use minebank_store::MetaStore;

    const T0: u64 = 1_700_000_000;

    fn ts(offset: u64) -> Timestamp {
        Timestamp::new(T0 + offset)
    }

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn flat_engine() -> AccrualEngine {
        let params = AccrualParams {
            auto_credit: false,
            ..AccrualParams::default()
        };
        AccrualEngine::new(&params, ts(0))
    }

    fn btc_engine() -> AccrualEngine {
        AccrualEngine::new(&AccrualParams::default(), ts(0))
    }

    #[test]
    fn flat_routing_credits_whole_intervals() {
        let mut engine = flat_engine();
        let result = engine.tick(ts(650));

        let accrual = result.accrual().expect("applied");
        assert_eq!(accrual.intervals, 2);
        assert_eq!(accrual.gross, amt("1.0"));
        assert_eq!(accrual.credited_to, CreditTarget::Flat);
        assert_eq!(accrual.new_balance, amt("101"));
        assert_eq!(engine.state().flat_balance, amt("101.0"));
        assert_eq!(engine.state().last_update, ts(600));
    }

    #[test]
    fn unit_routing_converts_gross() {
        let mut engine = btc_engine();
        let result = engine.tick(ts(900));

        let accrual = result.accrual().expect("applied");
        assert_eq!(accrual.intervals, 3);
        assert_eq!(accrual.gross, amt("1.5"));
        assert_eq!(accrual.credited_to, CreditTarget::Unit(Unit::Btc));
        assert_eq!(accrual.credited_amount, amt("0.0000375"));
        assert_eq!(engine.unit_balances().balance_of(Unit::Btc), amt("0.0000375"));
        assert_eq!(engine.state().flat_balance, amt("100"));
        assert_eq!(engine.state().last_update, ts(900));
    }

    #[test]
    fn remainder_carries_into_next_tick() {
        let mut engine = flat_engine();

        let first = engine.tick(ts(200));
        assert_eq!(
            first,
            AccrualResult::NoOp(NoOpReason::BelowInterval { elapsed_secs: 200 })
        );
        assert_eq!(engine.state().last_update, ts(0));

        let second = engine.tick(ts(350));
        assert_eq!(second.intervals_consumed(), 1);
        assert_eq!(engine.state().last_update, ts(300));
        assert_eq!(engine.state().flat_balance, amt("100.5"));
    }

    #[test]
    fn second_tick_at_same_instant_is_noop() {
        let mut engine = flat_engine();
        assert!(engine.tick(ts(610)).applied());
        let before = engine.clone();
        let again = engine.tick(ts(610));
        assert_eq!(
            again,
            AccrualResult::NoOp(NoOpReason::BelowInterval { elapsed_secs: 10 })
        );
        assert_eq!(engine, before);
    }

    #[test]
    fn clock_regression_leaves_state_unchanged() {
        let mut engine = flat_engine();
        let before = engine.clone();
        let result = engine.tick(Timestamp::new(T0 - 30));
        assert_eq!(
            result,
            AccrualResult::NoOp(NoOpReason::ClockRegression { behind_secs: 30 })
        );
        assert_eq!(engine, before);
    }

    #[test]
    fn disabled_engine_does_not_accrue() {
        let mut engine = flat_engine();
        engine.set_enabled(false, ts(10)).unwrap();
        assert_eq!(engine.tick(ts(5_000)), AccrualResult::NoOp(NoOpReason::Disabled));
        assert_eq!(engine.state().flat_balance, amt("100"));
    }

    #[test]
    fn missing_target_unit_withholds_without_advancing() {
        let mut state = AccrualState::new(&AccrualParams::default(), ts(0));
        state.target_unit = Unit::Eth;
        let mut balances = UnitBalances::with_all_units();
        balances.remove(Unit::Eth);
        let mut engine = AccrualEngine::from_parts(state, balances);

        let result = engine.tick(ts(600));
        assert_eq!(
            result,
            AccrualResult::Withheld {
                intervals: 2,
                reason: WithheldReason::UnrecognizedTargetUnit(Unit::Eth),
            }
        );
        assert_eq!(engine.state().last_update, ts(0));

        // Repairing the entry lets the same window be credited.
        engine.update_unit_wallet(Unit::Eth, None, None);
        let retried = engine.tick(ts(600));
        assert_eq!(retried.intervals_consumed(), 2);
        assert_eq!(engine.unit_balances().balance_of(Unit::Eth), amt("0.0004"));
    }

    #[test]
    fn overflow_is_withheld() {
        let mut engine = flat_engine();
        engine.state.rate_per_interval = Amount::new(u128::MAX);
        let result = engine.tick(ts(600));
        assert_eq!(
            result,
            AccrualResult::Withheld {
                intervals: 2,
                reason: WithheldReason::Overflow,
            }
        );
        assert_eq!(engine.state().last_update, ts(0));
    }

    #[test]
    fn unit_credit_adds_to_admin_overwritten_balance() {
        let mut engine = btc_engine();
        engine.update_unit_wallet(Unit::Btc, Some("bc1qexample".into()), Some(amt("2")));
        engine.tick(ts(300));
        let btc = engine.unit_balances().get(Unit::Btc).unwrap();
        assert_eq!(btc.balance, amt("2.0000125"));
        assert_eq!(btc.address, "bc1qexample");
    }

    #[test]
    fn set_enabled_settles_then_restarts_clock() {
        let mut engine = flat_engine();
        let settled = engine.set_enabled(false, ts(420)).unwrap();
        assert_eq!(settled.intervals_consumed(), 1);
        assert_eq!(engine.state().flat_balance, amt("100.5"));
        assert!(!engine.state().enabled);

        engine.set_enabled(true, ts(10_000)).unwrap();
        assert_eq!(engine.state().last_update, ts(10_000));
        assert!(!engine.tick(ts(10_100)).applied());
        assert_eq!(engine.tick(ts(10_300)).intervals_consumed(), 1);
    }

    #[test]
    fn set_enabled_refuses_when_settlement_withheld() {
        let mut engine = btc_engine();
        engine.set_target_unit("ETH").unwrap();
        engine.balances.remove(Unit::Eth);

        let err = engine.set_enabled(false, ts(3_000)).unwrap_err();
        assert!(matches!(err, AccrualError::SettlementWithheld(_)));
        assert!(engine.state().enabled);
        assert_eq!(engine.state().last_update, ts(0));

        // Once repaired, all ten intervals are still owed.
        engine.update_unit_wallet(Unit::Eth, None, None);
        let retried = engine.tick(ts(3_000));
        assert_eq!(retried.intervals_consumed(), 10);
        assert_eq!(engine.unit_balances().balance_of(Unit::Eth), amt("0.002"));
    }

    #[test]
    fn set_target_unit_validates_symbol() {
        let mut engine = btc_engine();
        assert_eq!(engine.set_target_unit("doge").unwrap(), Unit::Doge);
        assert_eq!(engine.state().target_unit, Unit::Doge);

        let err = engine.set_target_unit("XMR").unwrap_err();
        assert!(matches!(err, AccrualError::UnknownUnit(ref s) if s == "XMR"));
        assert_eq!(engine.state().target_unit, Unit::Doge);
    }

    #[test]
    fn set_target_unit_rejects_untracked_unit() {
        let mut engine = btc_engine();
        engine.balances.remove(Unit::Sol);
        let err = engine.set_target_unit("SOL").unwrap_err();
        assert!(matches!(err, AccrualError::UnitNotTracked(Unit::Sol)));
    }

    #[test]
    fn set_auto_credit_switches_routing() {
        let mut engine = btc_engine();
        engine.set_auto_credit(false, None).unwrap();
        engine.tick(ts(300));
        assert_eq!(engine.state().flat_balance, amt("100.5"));
        assert_eq!(engine.unit_balances().balance_of(Unit::Btc), Amount::ZERO);

        engine.set_auto_credit(true, Some(Unit::Usdt)).unwrap();
        engine.tick(ts(600));
        assert_eq!(engine.unit_balances().balance_of(Unit::Usdt), amt("0.5"));
        assert_eq!(engine.state().flat_balance, amt("100.5"));
    }

    #[test]
    fn set_rate_settles_at_old_rate() {
        let mut engine = flat_engine();
        let settled = engine.set_rate(amt("2"), ts(650)).unwrap();
        assert_eq!(settled.intervals_consumed(), 2);
        assert_eq!(engine.state().flat_balance, amt("101"));

        engine.tick(ts(900));
        assert_eq!(engine.state().flat_balance, amt("103"));
    }

    #[test]
    fn set_rate_refuses_when_settlement_withheld() {
        let mut engine = btc_engine();
        engine.balances.remove(Unit::Btc);
        let err = engine.set_rate(amt("9"), ts(600)).unwrap_err();
        assert!(matches!(err, AccrualError::SettlementWithheld(_)));
        assert_eq!(engine.state().rate_per_interval, amt("0.5"));
    }

    #[test]
    fn wallet_address_is_stored() {
        let mut engine = btc_engine();
        engine.set_wallet_address("0xabc");
        assert_eq!(engine.state().wallet_address, "0xabc");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let store = NullStore::new();
        let mut engine = btc_engine();
        engine.tick(ts(900));
        engine.update_unit_wallet(Unit::Ada, Some("addr1".into()), Some(amt("7")));
        engine.save_to_store(&store).unwrap();

        let loaded =
            AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(5_000)).unwrap();
        assert_eq!(loaded, engine);
        assert_eq!(store.get_schema_version().unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn load_from_empty_store_yields_defaults() {
        let store = NullStore::new();
        let engine =
            AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(0)).unwrap();
        assert_eq!(engine, btc_engine());
    }

    #[test]
    fn load_keeps_missing_units_missing() {
        let store = NullStore::new();
        btc_engine().save_to_store(&store).unwrap();
        store.remove_unit_balance("BTC");

        let mut loaded =
            AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(0)).unwrap();
        assert!(!loaded.unit_balances().contains(Unit::Btc));
        assert!(matches!(
            loaded.tick(ts(300)),
            AccrualResult::Withheld {
                reason: WithheldReason::UnrecognizedTargetUnit(Unit::Btc),
                ..
            }
        ));
    }

    #[test]
    fn load_rejects_newer_schema() {
        let store = NullStore::new();
        store.set_schema_version(SCHEMA_VERSION + 1).unwrap();
        let err = AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(0))
            .unwrap_err();
        assert!(matches!(err, AccrualError::SchemaMismatch { .. }));
    }

    #[test]
    fn update_in_store_initializes_empty_store() {
        let store = NullStore::new();
        let (engine, ()) =
            AccrualEngine::update_in_store(&store, &AccrualParams::default(), ts(0), |_| {
                Ok::<_, AccrualError>(())
            })
            .unwrap();
        assert_eq!(engine, btc_engine());
        assert_eq!(store.snapshot_count(), 1);
        assert_eq!(store.get_schema_version().unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn update_in_store_skips_write_when_unchanged() {
        let store = NullStore::new();
        btc_engine().save_to_store(&store).unwrap();

        let (_, result) =
            AccrualEngine::update_in_store(&store, &AccrualParams::default(), ts(0), |engine| {
                Ok::<_, AccrualError>(engine.tick(ts(120)))
            })
            .unwrap();
        assert!(!result.applied());
        assert_eq!(store.snapshot_count(), 1);
    }

    #[test]
    fn update_in_store_applies_to_current_contents() {
        let store = NullStore::new();
        btc_engine().save_to_store(&store).unwrap();

        // Another writer overwrites ETH after our last read.
        let mut admin =
            AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(0)).unwrap();
        admin.update_unit_wallet(Unit::Eth, Some("admin".into()), Some(amt("7")));
        admin.save_to_store(&store).unwrap();

        let (engine, result) =
            AccrualEngine::update_in_store(&store, &AccrualParams::default(), ts(300), |engine| {
                Ok::<_, AccrualError>(engine.tick(ts(300)))
            })
            .unwrap();
        assert!(result.applied());
        assert_eq!(engine.unit_balances().balance_of(Unit::Eth), amt("7"));

        let persisted =
            AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(0)).unwrap();
        assert_eq!(persisted.unit_balances().get(Unit::Eth).unwrap().address, "admin");
        assert_eq!(persisted.unit_balances().balance_of(Unit::Btc), amt("0.0000125"));
    }

    #[test]
    fn update_in_store_failed_op_writes_nothing() {
        let store = NullStore::new();
        btc_engine().save_to_store(&store).unwrap();

        let err = AccrualEngine::update_in_store(&store, &AccrualParams::default(), ts(0), |engine| {
            engine.set_wallet_address("discarded");
            engine.set_target_unit("XMR")
        })
        .unwrap_err();
        assert!(matches!(err, AccrualError::UnknownUnit(_)));
        assert_eq!(store.snapshot_count(), 1);
        let persisted =
            AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(0)).unwrap();
        assert!(persisted.state().wallet_address.is_empty());
    }

    #[test]
    fn reset_restores_defaults() {
        let store = NullStore::new();
        let mut engine = flat_engine();
        engine.tick(ts(3_000));
        engine.save_to_store(&store).unwrap();

        let fresh = AccrualEngine::reset(&store, &AccrualParams::default(), ts(4_000)).unwrap();
        assert_eq!(fresh.state().flat_balance, amt("100"));
        assert_eq!(fresh.state().last_update, ts(4_000));

        let loaded =
            AccrualEngine::load_from_store(&store, &AccrualParams::default(), ts(9_999)).unwrap();
        assert_eq!(loaded, fresh);
    }
}
