//! Abstract storage traits for the minebank accrual engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! these traits. The rest of the codebase depends only on the traits.

pub mod accrual;
pub mod error;
pub mod meta;

pub use accrual::{AccrualSnapshot, AccrualStore, StoredAccrual};
pub use error::StoreError;
pub use meta::{decode_schema_version, MetaStore, SCHEMA_VERSION_KEY};

/// A complete backend: accrual data plus metadata, shareable across tasks.
pub trait Backend: AccrualStore + MetaStore + Send + Sync {}

impl<T: AccrualStore + MetaStore + Send + Sync> Backend for T {}
