//! Persistent key-value storage for client credentials.
//!
//! This module provides:
//! - `KeyValueStore`: the storage seam the API client reads the token through
//! - `MemoryStore`: in-process storage for tests and embedders
//! - `FileStore`: a JSON document on disk
//! - `KeyringStore`: secure OS-level storage via keyring
//!
//! The client only ever touches `TOKEN_KEY`: it reads it before every request
//! and removes it when the server answers 403.

pub mod credentials;
pub mod file;
pub mod memory;

use thiserror::Error;

pub use credentials::KeyringStore;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key holding the authorization token
pub const TOKEN_KEY: &str = "token";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a key that is not present is not an error
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
