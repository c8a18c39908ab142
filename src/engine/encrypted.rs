use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::vault::{self, MasterKey};
use crate::{Collection, Error, KVStore, Record, Result};

/// What the inner store actually holds for every record.
///
/// Only `id` is readable without the key; the rest of the record is inside
/// `cipher_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    pub id: String,
    pub cipher_text: String,
    pub iv: String,
}

impl EncryptedRecord {
    /// Serializes `record` to JSON and seals it under `key`.
    pub fn seal<R: Serialize>(id: &str, record: &R, key: &MasterKey) -> Result<Self> {
        let json = serde_json::to_vec(record)?;
        let sealed = vault::encrypt(&json, key)?;
        Ok(Self {
            id: id.to_string(),
            cipher_text: sealed.cipher_text,
            iv: sealed.iv,
        })
    }

    /// Decrypts and deserializes the payload without checking the embedded id.
    pub fn open_value<T: DeserializeOwned>(&self, key: &MasterKey) -> Result<T> {
        let json = vault::decrypt(&self.cipher_text, &self.iv, key)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Decrypts and deserializes a record, rejecting envelopes whose id differs
    /// from the one inside the payload.
    pub fn open<R: Record>(&self, key: &MasterKey) -> Result<R> {
        let record: R = self.open_value(key)?;
        if record.id() != self.id {
            return Err(Error::DecryptionFailure(format!(
                "envelope id {} does not match payload id {}",
                self.id,
                record.id()
            )));
        }
        Ok(record)
    }
}

/// The in-memory session key. Empty means locked.
#[derive(Default)]
pub struct SessionKey {
    slot: RwLock<Option<MasterKey>>,
}

impl SessionKey {
    pub fn set(&self, key: MasterKey) {
        match self.slot.write() {
            Ok(mut slot) => *slot = Some(key),
            Err(poisoned) => *poisoned.into_inner() = Some(key),
        }
    }

    /// Drops the key; `MasterKey` zeroizes itself.
    pub fn clear(&self) {
        match self.slot.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.slot.read().map(|k| k.is_some()).unwrap_or(false)
    }

    fn with_key<T>(&self, f: impl FnOnce(&MasterKey) -> Result<T>) -> Result<T> {
        let slot = self
            .slot
            .read()
            .map_err(|_| Error::Internal("session key lock poisoned".to_string()))?;
        let key = slot.as_ref().ok_or(Error::Locked)?;
        f(key)
    }
}

/// Encrypting wrapper around a [`KVStore`].
///
/// Records go in as typed values and are stored as [`EncryptedRecord`] envelopes.
/// Every operation fails with [`Error::Locked`] until [`EncryptedStore::set_key`]
/// has been called.
pub struct EncryptedStore {
    inner: Arc<dyn KVStore>,
    key: SessionKey,
}

impl EncryptedStore {
    pub fn new(inner: Arc<dyn KVStore>) -> Self {
        Self { inner, key: SessionKey::default() }
    }

    /// Installs the session key. Callers must not race this with in-flight reads or writes.
    pub fn set_key(&self, key: MasterKey) {
        self.key.set(key);
        log::info!("Encrypted store unlocked");
    }

    pub fn lock(&self) {
        self.key.clear();
        log::info!("Encrypted store locked");
    }

    pub fn is_locked(&self) -> bool {
        !self.key.is_set()
    }

    /// Encrypts and stores a record under its id.
    pub async fn save<R: Record>(&self, record: &R) -> Result<()> {
        let envelope = self
            .key
            .with_key(|key| EncryptedRecord::seal(record.id(), record, key))?;
        self.inner
            .put(R::COLLECTION, &envelope.id, serde_json::to_value(&envelope)?)
            .await
    }

    /// Fetches and decrypts one record. Any decryption problem is returned to the caller.
    pub async fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        self.ensure_unlocked()?;
        let Some(raw) = self.inner.get(R::COLLECTION, id).await? else {
            return Ok(None);
        };
        let envelope = parse_envelope(raw)?;
        self.key.with_key(|key| envelope.open(key)).map(Some)
    }

    /// Fetches and decrypts a whole collection.
    ///
    /// A record that cannot be decrypted or parsed is logged and skipped so the
    /// rest of the collection is still returned.
    pub async fn get_all<R: Record>(&self) -> Result<Vec<R>> {
        self.ensure_unlocked()?;
        let raw_records = self.inner.get_all(R::COLLECTION).await?;

        self.key.with_key(|key| {
            let mut records = Vec::with_capacity(raw_records.len());
            for raw in raw_records {
                let opened = parse_envelope(raw).and_then(|env| {
                    env.open::<R>(key).map_err(|e| tag(&env.id, e))
                });
                match opened {
                    Ok(record) => records.push(record),
                    Err(e) => log::warn!("Skipping record in {}: {}", R::COLLECTION, e),
                }
            }
            Ok(records)
        })
    }

    /// Deletes a record. Requires the store to be unlocked even though no
    /// decryption happens, so a locked vault cannot be tampered with.
    pub async fn delete<R: Record>(&self, id: &str) -> Result<()> {
        self.delete_in(R::COLLECTION, id).await
    }

    pub async fn delete_in(&self, collection: Collection, id: &str) -> Result<()> {
        self.ensure_unlocked()?;
        self.inner.delete(collection, id).await
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            return Err(Error::Locked);
        }
        Ok(())
    }
}

fn parse_envelope(raw: serde_json::Value) -> Result<EncryptedRecord> {
    serde_json::from_value(raw).map_err(|e| Error::DecryptionFailure(format!("malformed envelope: {}", e)))
}

fn tag(id: &str, e: Error) -> Error {
    match e {
        Error::DecryptionFailure(msg) => Error::DecryptionFailure(format!("{}: {}", id, msg)),
        Error::Serialization(err) => Error::DecryptionFailure(format!("{}: payload does not parse: {}", id, err)),
        other => other,
    }
}
