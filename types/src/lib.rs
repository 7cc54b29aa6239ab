//! Fundamental types for the minebank accrual engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! fixed-point amounts, timestamps and clocks, credit units, and accrual parameters.

pub mod amount;
pub mod error;
pub mod params;
pub mod time;
pub mod unit;

pub use amount::{Amount, ConversionRate, AMOUNT_SCALE};
pub use error::TypesError;
pub use params::{AccrualParams, ACCRUAL_INTERVAL_SECS};
pub use time::{Clock, SystemClock, Timestamp};
pub use unit::Unit;
