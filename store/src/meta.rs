//! Metadata storage trait.

use crate::StoreError;

/// Metadata key holding the on-disk layout version.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Decode a stored schema version (big-endian `u32`).
pub fn decode_schema_version(bytes: &[u8]) -> Result<u32, StoreError> {
    let raw: [u8; 4] = bytes
        .try_into()
        .map_err(|_| StoreError::Corruption(format!("schema version has {} bytes", bytes.len())))?;
    Ok(u32::from_be_bytes(raw))
}

/// Trait for storing database metadata (schema version and similar bookkeeping).
pub trait MetaStore {
    /// Store a metadata value.
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve a metadata value, `None` if absent.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Get the stored schema version, `None` for a fresh store.
    fn get_schema_version(&self) -> Result<Option<u32>, StoreError> {
        self.get_meta(SCHEMA_VERSION_KEY)?
            .map(|bytes| decode_schema_version(&bytes))
            .transpose()
    }

    /// Set the schema version.
    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(SCHEMA_VERSION_KEY, &version.to_be_bytes())
    }
}
