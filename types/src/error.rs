//! Errors raised while parsing or validating core types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid amount {0:?}: expected a non-negative decimal")]
    InvalidAmount(String),

    #[error("amount {0:?} has more than 12 fractional digits")]
    TooPrecise(String),

    #[error("amount {0:?} is too large")]
    AmountOverflow(String),

    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
}
