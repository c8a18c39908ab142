//! Kairos Store is a local-first personal data store.
//!
//! Every record is encrypted at rest behind a single passphrase-derived key. Records
//! live in a small set of named collections and are reached through typed repositories.
//! Two pure engines sit on top: an SM-2 style flashcard scheduler and a streak/heatmap
//! aggregator over the activity log.
//!
//! ## Core Components
//! - [`engine`]: The key-value store (in-memory with persistence) and the encryption wrapper.
//! - [`repository`]: Typed façades over the encrypted store.
//! - [`scheduler`]: Spaced-repetition review scheduling.
//! - [`analytics`]: Streak and heatmap aggregation.
//! - [`sdk`]: The [`sdk::Workspace`] that wires everything together behind an unlock step.

pub mod analytics;
pub mod engine;
pub mod export;
pub mod models;
pub mod repository;
pub mod scheduler;
pub mod sdk;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the Kairos Store.
#[derive(Error, Debug)]
pub enum Error {
    /// No session key is installed; unlock first.
    #[error("storage is locked")]
    Locked,
    /// Ciphertext, key and IV do not match, or the envelope is malformed.
    #[error("decryption failed: {0}")]
    DecryptionFailure(String),
    /// The store was addressed with a collection it does not know about.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    /// The passphrase was empty or does not open this vault.
    #[error("invalid passphrase")]
    InvalidPassphrase,
    /// A collection file exists but cannot be read back. It is left untouched on disk.
    #[error("corrupt collection file {path:?}: {reason}")]
    CorruptCollection { path: std::path::PathBuf, reason: String },
    /// An append-only record with this id already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// A workflow operation needed a record that does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for Kairos Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of collections the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Tasks,
    Notes,
    Folders,
    Decks,
    Flashcards,
    Activities,
    CalendarEvents,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Tasks,
        Collection::Notes,
        Collection::Folders,
        Collection::Decks,
        Collection::Flashcards,
        Collection::Activities,
        Collection::CalendarEvents,
    ];

    /// The name used on disk and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Notes => "notes",
            Collection::Folders => "folders",
            Collection::Decks => "decks",
            Collection::Flashcards => "flashcards",
            Collection::Activities => "activities",
            Collection::CalendarEvents => "calendar_events",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Collection::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCollection(s.to_string()))
    }
}

/// A domain record bound to exactly one collection.
///
/// The binding is static, so a record type can never be written to the wrong
/// partition of the store.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// The collection records of this type live in.
    const COLLECTION: Collection;

    /// The stable identifier, stored in plaintext next to the ciphertext.
    fn id(&self) -> &str;
}

/// Defines basic read operations for the store.
#[async_trait]
pub trait KVReader: Send + Sync {
    /// Retrieves a record by id. An absent id is `Ok(None)`, not an error.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<serde_json::Value>>;
    /// Returns every record in a collection, in no particular order.
    async fn get_all(&self, collection: Collection) -> Result<Vec<serde_json::Value>>;
}

/// Defines basic write and delete operations for the store.
#[async_trait]
pub trait KVWriter: Send + Sync {
    /// Stores a record under an id, replacing any previous value.
    async fn put(&self, collection: Collection, id: &str, value: serde_json::Value) -> Result<()>;
    /// Removes a record. Deleting an absent id succeeds.
    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;
}

/// The full storage contract the encryption wrapper is layered on.
pub trait KVStore: KVReader + KVWriter {}

impl<T: KVReader + KVWriter> KVStore for T {}
