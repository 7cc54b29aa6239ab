//! Accrual: the periodic mining-balance engine.
//!
//! Accrual is a step function of time: every whole 300-second interval since
//! `last_update` earns `rate_per_interval`.
//! `accrued = floor((now − last_update) / 300) × rate`
//!
//! This crate handles:
//! - Counting whole elapsed intervals without losing the sub-interval remainder
//! - Routing accrual to the flat balance or a converted unit balance
//! - Control operations (toggle, target unit, rate change, admin overwrites)
//! - Persisting state through the `minebank-store` traits

pub mod engine;
pub mod error;
pub mod result;
pub mod state;

pub use engine::{AccrualEngine, SCHEMA_VERSION};
pub use error::AccrualError;
pub use result::{Accrual, AccrualResult, CreditTarget, NoOpReason, WithheldReason};
pub use state::{AccrualState, UnitBalance, UnitBalances};
