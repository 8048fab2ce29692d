//! LocalStore Port - durable, device-local string key/value storage.
//!
//! The browser-localStorage analogue: synchronous, string keys, string
//! values. Callers own the key scheme and the serialization format.

/// Errors that can occur during local store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocalStoreError {
    #[error("Local store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for device-local key/value persistence
pub trait LocalStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    /// Write a value, replacing whatever was there.
    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}
