use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use minebank_store::{
    decode_schema_version, AccrualSnapshot, AccrualStore, MetaStore, StoreError, StoredAccrual,
    SCHEMA_VERSION_KEY,
};

use crate::meta::LmdbMetaStore;
use crate::LmdbError;

const STATE_KEY: &[u8] = b"state";

pub struct LmdbAccrualStore {
    env: Arc<Env>,
    accrual_db: Database<Bytes, Bytes>,
    units_db: Database<Bytes, Bytes>,
    meta: LmdbMetaStore,
}

impl LmdbAccrualStore {
    pub fn new(
        env: Arc<Env>,
        accrual_db: Database<Bytes, Bytes>,
        units_db: Database<Bytes, Bytes>,
        meta: LmdbMetaStore,
    ) -> Self {
        Self {
            env,
            accrual_db,
            units_db,
            meta,
        }
    }

    /// State, unit balances and schema version as seen by `txn`.
    fn read_all(&self, txn: &RoTxn<'_>) -> Result<StoredAccrual, LmdbError> {
        let state = self.accrual_db.get(txn, STATE_KEY)?.map(|bytes| bytes.to_vec());

        let mut units = Vec::new();
        for item in self.units_db.iter(txn)? {
            let (key, val) = item?;
            let symbol =
                std::str::from_utf8(key).map_err(|e| LmdbError::InvalidKey(e.to_string()))?;
            units.push((symbol.to_string(), val.to_vec()));
        }

        let schema_version = match self.meta.meta_db.get(txn, SCHEMA_VERSION_KEY.as_bytes())? {
            Some(bytes) => Some(
                decode_schema_version(bytes).map_err(|e| LmdbError::Corrupt(e.to_string()))?,
            ),
            None => None,
        };

        Ok(StoredAccrual {
            state,
            units,
            schema_version,
        })
    }
}

impl AccrualStore for LmdbAccrualStore {
    fn get_accrual_state(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .accrual_db
            .get(&rtxn, STATE_KEY)
            .map_err(LmdbError::from)?;
        Ok(val.map(|bytes| bytes.to_vec()))
    }

    fn put_accrual_state(&self, state: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.accrual_db
            .put(&mut wtxn, STATE_KEY, state)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_unit_balance(&self, symbol: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .units_db
            .get(&rtxn, symbol.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(|bytes| bytes.to_vec()))
    }

    fn put_unit_balance(&self, symbol: &str, balance: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.units_db
            .put(&mut wtxn, symbol.as_bytes(), balance)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_unit_balances(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self.load()?.units)
    }

    fn load(&self) -> Result<StoredAccrual, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_all(&rtxn)?)
    }

    fn update(
        &self,
        f: &mut dyn FnMut(StoredAccrual) -> Option<AccrualSnapshot>,
    ) -> Result<bool, StoreError> {
        // LMDB allows one write txn per environment across processes, so
        // holding it from the read to the commit excludes every other writer.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let current = self.read_all(&wtxn)?;
        let Some(snapshot) = f(current) else {
            wtxn.abort();
            return Ok(false);
        };

        self.accrual_db
            .put(&mut wtxn, STATE_KEY, &snapshot.state)
            .map_err(LmdbError::from)?;
        for (symbol, bytes) in &snapshot.units {
            self.units_db
                .put(&mut wtxn, symbol.as_bytes(), bytes)
                .map_err(LmdbError::from)?;
        }
        self.meta
            .meta_db
            .put(
                &mut wtxn,
                SCHEMA_VERSION_KEY.as_bytes(),
                &snapshot.schema_version.to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.accrual_db.clear(&mut wtxn).map_err(LmdbError::from)?;
        self.units_db.clear(&mut wtxn).map_err(LmdbError::from)?;
        self.meta.meta_db.clear(&mut wtxn).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::info!("accrual store cleared");
        Ok(())
    }
}

impl MetaStore for LmdbAccrualStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta.put_meta(key, value)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.meta.get_meta(key)
    }
}
