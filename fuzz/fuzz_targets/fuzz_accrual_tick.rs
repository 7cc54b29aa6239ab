#![no_main]

use libfuzzer_sys::fuzz_target;

use minebank_accrual::{AccrualEngine, AccrualResult};
use minebank_types::{AccrualParams, Amount, Timestamp, Unit, ACCRUAL_INTERVAL_SECS};

// Drive the engine with arbitrary rates, routing and clock jumps (including
// backwards ones). Ticks must never panic and last_update must only move
// forward by whole intervals.
fuzz_target!(|data: &[u8]| {
    if data.len() < 16 {
        return;
    }

    let rate = u64::from_le_bytes([
        data[0], data[1], data[2], data[3],
        data[4], data[5], data[6], data[7],
    ]) as u128;

    let start = u64::from_le_bytes([
        data[8], data[9], data[10], data[11],
        data[12], data[13], data[14], data[15],
    ]);

    let params = AccrualParams {
        rate_per_interval: Amount::new(rate.saturating_mul(rate)),
        ..AccrualParams::default()
    };
    let mut engine = AccrualEngine::new(&params, Timestamp::new(start));

    let remaining = &data[16..];
    let mut offset = 0;
    let mut now = start;
    while offset + 9 <= remaining.len() {
        let op = remaining[offset];
        let jump = u64::from_le_bytes([
            remaining[offset + 1], remaining[offset + 2],
            remaining[offset + 3], remaining[offset + 4],
            remaining[offset + 5], remaining[offset + 6],
            remaining[offset + 7], remaining[offset + 8],
        ]);

        match op % 4 {
            0 => now = now.saturating_add(jump % 1_000_000),
            1 => now = now.saturating_sub(jump % 1_000),
            2 => {
                let unit = Unit::ALL[(jump % Unit::ALL.len() as u64) as usize];
                let _ = engine.set_auto_credit(jump & 1 == 0, Some(unit));
            }
            _ => {
                let _ = engine.set_rate(Amount::new(jump as u128), Timestamp::new(now));
            }
        }

        let before = engine.state().last_update;
        match engine.tick(Timestamp::new(now)) {
            AccrualResult::Applied(accrual) => {
                let advanced = engine.state().last_update.as_secs() - before.as_secs();
                assert_eq!(advanced, accrual.intervals * ACCRUAL_INTERVAL_SECS);
                assert!(engine.state().last_update.as_secs() <= now);
            }
            _ => assert_eq!(engine.state().last_update, before),
        }

        offset += 9;
    }
});
