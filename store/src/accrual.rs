use crate::meta::MetaStore;
use crate::StoreError;

/// Everything an accrual store holds, read from one consistent view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredAccrual {
    /// Encoded accrual state; `None` for a fresh store.
    pub state: Option<Vec<u8>>,
    /// Encoded unit balances keyed by ticker symbol.
    pub units: Vec<(String, Vec<u8>)>,
    pub schema_version: Option<u32>,
}

/// A full write: state, unit balances and the layout version they were
/// encoded with. Unit entries not listed are left as they are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccrualSnapshot {
    pub state: Vec<u8>,
    pub units: Vec<(String, Vec<u8>)>,
    pub schema_version: u32,
}

/// Store trait for persisting accrual engine state to durable storage.
///
/// Uses opaque `Vec<u8>` so the store doesn't depend on the `minebank-accrual`
/// crate. The engine serializes/deserializes its own types. Unit balances are
/// keyed by ticker symbol.
pub trait AccrualStore: MetaStore {
    fn get_accrual_state(&self) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_accrual_state(&self, state: &[u8]) -> Result<(), StoreError>;

    fn get_unit_balance(&self, symbol: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_unit_balance(&self, symbol: &str, balance: &[u8]) -> Result<(), StoreError>;
    fn iter_unit_balances(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Read state, unit balances and schema version.
    ///
    /// Backends with transactions override this to read from one snapshot.
    fn load(&self) -> Result<StoredAccrual, StoreError> {
        Ok(StoredAccrual {
            state: self.get_accrual_state()?,
            units: self.iter_unit_balances()?,
            schema_version: self.get_schema_version()?,
        })
    }

    /// Read-modify-write as one exclusive step.
    ///
    /// `f` receives the current contents and returns the snapshot to write,
    /// or `None` to leave the store untouched. No other writer, in this
    /// process or another, may commit between the read and the write.
    /// Returns whether anything was written.
    fn update(
        &self,
        f: &mut dyn FnMut(StoredAccrual) -> Option<AccrualSnapshot>,
    ) -> Result<bool, StoreError>;

    /// Write a snapshot unconditionally, in a single commit.
    fn put_snapshot(&self, snapshot: AccrualSnapshot) -> Result<(), StoreError> {
        let mut pending = Some(snapshot);
        self.update(&mut |_: StoredAccrual| pending.take())?;
        Ok(())
    }

    /// Remove everything: state, unit balances and metadata.
    fn clear(&self) -> Result<(), StoreError>;
}
