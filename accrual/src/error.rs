//! Accrual-specific errors.

use minebank_store::StoreError;
use minebank_types::Unit;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccrualError {
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),

    #[error("unit {0} has no balance entry")]
    UnitNotTracked(Unit),

    #[error("pending intervals could not be settled: {0}")]
    SettlementWithheld(String),

    #[error("store schema version {found} is newer than supported version {supported}")]
    SchemaMismatch { found: u32, supported: u32 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
