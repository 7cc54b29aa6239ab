//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::accrual::LmdbAccrualStore;
use crate::meta::LmdbMetaStore;
use crate::LmdbError;

/// Named databases opened inside the environment.
const DB_ACCRUAL: &str = "accrual";
const DB_UNITS: &str = "unit_balances";
const DB_META: &str = "meta";

/// Databases the environment needs room for.
pub const REQUIRED_DBS: u32 = 3;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    accrual_db: Database<Bytes, Bytes>,
    units_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path and
        // the memory map is not modified outside of heed transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(REQUIRED_DBS))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let accrual_db = env.create_database(&mut wtxn, Some(DB_ACCRUAL))?;
        let units_db = env.create_database(&mut wtxn, Some(DB_UNITS))?;
        let meta_db = env.create_database(&mut wtxn, Some(DB_META))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            accrual_db,
            units_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Accrual state and unit balances, sharing this environment.
    pub fn accrual_store(&self) -> LmdbAccrualStore {
        LmdbAccrualStore::new(
            Arc::clone(&self.env),
            self.accrual_db,
            self.units_db,
            self.meta_store(),
        )
    }

    /// Metadata store sharing this environment.
    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
