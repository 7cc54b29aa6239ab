//! Nullable store: thread-safe in-memory storage for testing.

use minebank_store::{
    decode_schema_version, AccrualSnapshot, AccrualStore, MetaStore, StoreError, StoredAccrual,
    SCHEMA_VERSION_KEY,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Contents {
    state: Option<Vec<u8>>,
    units: BTreeMap<String, Vec<u8>>,
    meta: HashMap<String, Vec<u8>>,
}

impl Contents {
    fn stored(&self) -> Result<StoredAccrual, StoreError> {
        Ok(StoredAccrual {
            state: self.state.clone(),
            units: self
                .units
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            schema_version: self
                .meta
                .get(SCHEMA_VERSION_KEY)
                .map(|bytes| decode_schema_version(bytes))
                .transpose()?,
        })
    }
}

/// An in-memory accrual + meta store for testing.
/// One lock guards everything, so `update` is exclusive like an LMDB write txn.
pub struct NullStore {
    contents: Mutex<Contents>,
    snapshots: AtomicU64,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            contents: Mutex::new(Contents::default()),
            snapshots: AtomicU64::new(0),
        }
    }

    /// Number of snapshot writes so far.
    pub fn snapshot_count(&self) -> u64 {
        self.snapshots.load(Ordering::SeqCst)
    }

    /// Drop one unit entry, simulating a store edited behind the engine's back.
    pub fn remove_unit_balance(&self, symbol: &str) {
        self.contents.lock().unwrap().units.remove(symbol);
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccrualStore for NullStore {
    fn get_accrual_state(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.contents.lock().unwrap().state.clone())
    }

    fn put_accrual_state(&self, state: &[u8]) -> Result<(), StoreError> {
        self.contents.lock().unwrap().state = Some(state.to_vec());
        Ok(())
    }

    fn get_unit_balance(&self, symbol: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.contents.lock().unwrap().units.get(symbol).cloned())
    }

    fn put_unit_balance(&self, symbol: &str, balance: &[u8]) -> Result<(), StoreError> {
        self.contents
            .lock()
            .unwrap()
            .units
            .insert(symbol.to_string(), balance.to_vec());
        Ok(())
    }

    fn iter_unit_balances(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self.contents.lock().unwrap().stored()?.units)
    }

    fn load(&self) -> Result<StoredAccrual, StoreError> {
        self.contents.lock().unwrap().stored()
    }

    fn update(
        &self,
        f: &mut dyn FnMut(StoredAccrual) -> Option<AccrualSnapshot>,
    ) -> Result<bool, StoreError> {
        let mut contents = self.contents.lock().unwrap();
        let Some(snapshot) = f(contents.stored()?) else {
            return Ok(false);
        };
        contents.state = Some(snapshot.state);
        contents.units.extend(snapshot.units);
        contents.meta.insert(
            SCHEMA_VERSION_KEY.to_string(),
            snapshot.schema_version.to_be_bytes().to_vec(),
        );
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.contents.lock().unwrap() = Contents::default();
        Ok(())
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.contents
            .lock()
            .unwrap()
            .meta
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.contents.lock().unwrap().meta.get(key).cloned())
    }
}
