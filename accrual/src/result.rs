//! Outcome of one tick, handed to whoever displays or logs it.

use minebank_types::{Amount, Timestamp, Unit};
use std::fmt;

/// Where accrued value was credited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditTarget {
    Flat,
    Unit(Unit),
}

impl fmt::Display for CreditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => f.write_str("flat"),
            Self::Unit(unit) => write!(f, "{unit}"),
        }
    }
}

/// A successfully applied accrual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accrual {
    /// Whole intervals consumed.
    pub intervals: u64,
    /// `intervals × rate`, in flat currency.
    pub gross: Amount,
    pub credited_to: CreditTarget,
    /// Amount added to the target, after unit conversion.
    pub credited_amount: Amount,
    /// Balance of the credited target after this accrual.
    pub new_balance: Amount,
    /// `last_update` after advancing.
    pub last_update: Timestamp,
}

/// Why a tick changed nothing. None of these are errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoOpReason {
    Disabled,
    /// Less than one interval since `last_update`; the remainder stays owed.
    BelowInterval { elapsed_secs: u64 },
    /// `now` is earlier than `last_update`; treated as zero elapsed.
    ClockRegression { behind_secs: u64 },
}

/// Why whole intervals were due but not credited. `last_update` stays put, so
/// a later tick retries the same window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WithheldReason {
    /// The target unit has no balance entry.
    UnrecognizedTargetUnit(Unit),
    /// Checked arithmetic overflowed.
    Overflow,
}

impl fmt::Display for WithheldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedTargetUnit(unit) => write!(f, "target unit {unit} has no balance entry"),
            Self::Overflow => f.write_str("arithmetic overflow"),
        }
    }
}

/// Result of [`AccrualEngine::tick`](crate::AccrualEngine::tick).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccrualResult {
    Applied(Accrual),
    NoOp(NoOpReason),
    Withheld { intervals: u64, reason: WithheldReason },
}

impl AccrualResult {
    /// Whether any balance changed.
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn accrual(&self) -> Option<&Accrual> {
        match self {
            Self::Applied(accrual) => Some(accrual),
            _ => None,
        }
    }

    /// Intervals consumed; zero unless applied.
    pub fn intervals_consumed(&self) -> u64 {
        self.accrual().map(|a| a.intervals).unwrap_or(0)
    }
}
