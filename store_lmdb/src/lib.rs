//! LMDB storage backend for the minebank accrual engine.
//!
//! Implements the storage traits from `minebank-store` using the `heed` LMDB bindings.
//! Each logical store maps to one LMDB database within a single environment.

pub mod accrual;
pub mod environment;
pub mod error;
pub mod meta;

pub use accrual::LmdbAccrualStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
