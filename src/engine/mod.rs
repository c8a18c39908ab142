//! Storage engine: the plain key-value store, its persistence, and the
//! encryption wrapper layered on top of it.
pub mod encrypted;
pub mod memstore;
pub mod persistence;
pub mod vault;

pub use encrypted::{EncryptedRecord, EncryptedStore};
pub use memstore::MemStore;
pub use persistence::{Persistence, VaultMeta};
pub use vault::MasterKey;
