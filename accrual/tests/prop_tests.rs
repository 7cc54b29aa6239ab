use proptest::prelude::*;

use minebank_accrual::{AccrualEngine, AccrualResult, NoOpReason};
use minebank_types::{AccrualParams, Amount, Timestamp, Unit, AMOUNT_SCALE, ACCRUAL_INTERVAL_SECS};

const T0: u64 = 1_700_000_000;

fn engine(auto_credit: bool, rate_raw: u128) -> AccrualEngine {
    let params = AccrualParams {
        auto_credit,
        rate_per_interval: Amount::new(rate_raw),
        ..AccrualParams::default()
    };
    AccrualEngine::new(&params, Timestamp::new(T0))
}

/// Total credited to the flat balance so far.
fn flat_accrued(engine: &AccrualEngine) -> Amount {
    Amount::new(engine.state().flat_balance.raw() - Amount::from_whole(100).raw())
}

proptest! {
    /// Splitting elapsed time across many ticks credits exactly what one tick would.
    #[test]
    fn split_ticks_match_single_tick(
        rate_raw in 1u128..100 * AMOUNT_SCALE,
        steps in prop::collection::vec(0u64..1_000, 1..40),
    ) {
        let mut split = engine(false, rate_raw);
        let mut now = T0;
        for step in &steps {
            now += step;
            split.tick(Timestamp::new(now));
        }

        let mut single = engine(false, rate_raw);
        single.tick(Timestamp::new(now));

        let total = now - T0;
        let expected = Amount::new(rate_raw)
            .checked_mul_count(total / ACCRUAL_INTERVAL_SECS)
            .unwrap();
        prop_assert_eq!(flat_accrued(&split), expected);
        prop_assert_eq!(flat_accrued(&single), expected);
        prop_assert_eq!(split.state().last_update, single.state().last_update);
    }

    /// A tick below one interval leaves last_update in place.
    #[test]
    fn sub_interval_tick_keeps_last_update(elapsed in 0u64..ACCRUAL_INTERVAL_SECS) {
        let mut e = engine(false, AMOUNT_SCALE);
        let result = e.tick(Timestamp::new(T0 + elapsed));
        prop_assert_eq!(result, AccrualResult::NoOp(NoOpReason::BelowInterval { elapsed_secs: elapsed }));
        prop_assert_eq!(e.state().last_update, Timestamp::new(T0));
    }

    /// last_update only moves by whole intervals and never past `now`.
    #[test]
    fn last_update_advances_by_whole_intervals(elapsed in 0u64..10_000_000) {
        let mut e = engine(true, AMOUNT_SCALE / 2);
        let now = T0 + elapsed;
        e.tick(Timestamp::new(now));
        let advanced = e.state().last_update.as_secs() - T0;
        prop_assert_eq!(advanced % ACCRUAL_INTERVAL_SECS, 0);
        prop_assert!(now - e.state().last_update.as_secs() < ACCRUAL_INTERVAL_SECS);
    }

    /// Ticking twice at the same instant credits once.
    #[test]
    fn repeated_tick_is_noop(elapsed in 0u64..1_000_000) {
        let mut e = engine(false, AMOUNT_SCALE);
        let now = Timestamp::new(T0 + elapsed);
        e.tick(now);
        let snapshot = e.clone();
        prop_assert!(!e.tick(now).applied());
        prop_assert_eq!(e, snapshot);
    }

    /// Routing is exclusive: unit routing never touches flat, flat never touches units.
    #[test]
    fn routing_is_exclusive(auto_credit in any::<bool>(), elapsed in 0u64..1_000_000, unit_idx in 0usize..10) {
        let mut e = engine(auto_credit, AMOUNT_SCALE / 2);
        let unit = Unit::ALL[unit_idx];
        e.set_auto_credit(auto_credit, Some(unit)).unwrap();
        let before = e.clone();
        e.tick(Timestamp::new(T0 + elapsed));

        if auto_credit {
            prop_assert_eq!(e.state().flat_balance, before.state().flat_balance);
            for other in Unit::ALL.into_iter().filter(|u| *u != unit) {
                prop_assert_eq!(e.unit_balances().get(other), before.unit_balances().get(other));
            }
        } else {
            prop_assert_eq!(e.unit_balances(), before.unit_balances());
        }
    }

    /// A clock that runs backwards changes nothing.
    #[test]
    fn clock_regression_is_noop(behind in 1u64..T0) {
        let mut e = engine(false, AMOUNT_SCALE);
        let before = e.clone();
        let result = e.tick(Timestamp::new(T0 - behind));
        prop_assert!(!result.applied());
        prop_assert_eq!(e, before);
    }

    /// Unit credit equals gross converted at the table rate.
    #[test]
    fn unit_credit_uses_conversion_table(intervals in 1u64..10_000, unit_idx in 0usize..10) {
        let unit = Unit::ALL[unit_idx];
        let mut e = engine(true, AMOUNT_SCALE / 2);
        e.set_auto_credit(true, Some(unit)).unwrap();
        let result = e.tick(Timestamp::new(T0 + intervals * ACCRUAL_INTERVAL_SECS));
        let accrual = result.accrual().unwrap();
        let expected = accrual.gross.checked_convert(unit.conversion_rate()).unwrap();
        prop_assert_eq!(accrual.credited_amount, expected);
        prop_assert_eq!(e.unit_balances().balance_of(unit), expected);
    }
}
