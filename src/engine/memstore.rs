use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::engine::persistence::CollectionData;
use crate::engine::Persistence;
use crate::{Collection, Error, KVReader, KVWriter, Result};

type StoreData = HashMap<Collection, CollectionData>;

/// Collection-partitioned in-memory store with optional write-through persistence.
///
/// Only collections registered at construction exist. Addressing any other one
/// fails with [`Error::UnknownCollection`].
pub struct MemStore {
    data: RwLock<StoreData>,
    persistence: Option<Arc<Persistence>>,
    // Serialises snapshot-and-write so an older snapshot never lands after a newer one.
    write_lock: tokio::sync::Mutex<()>,
}

impl MemStore {
    /// Creates a store with every known collection registered.
    pub fn new(initial_data: HashMap<Collection, CollectionData>, persistence: Option<Arc<Persistence>>) -> Self {
        Self::with_schema(&Collection::ALL, initial_data, persistence)
    }

    /// Creates a store that only knows `schema`. Initial data for other collections is dropped.
    pub fn with_schema(
        schema: &[Collection],
        mut initial_data: HashMap<Collection, CollectionData>,
        persistence: Option<Arc<Persistence>>,
    ) -> Self {
        let data = schema
            .iter()
            .map(|c| (*c, initial_data.remove(c).unwrap_or_default()))
            .collect::<StoreData>();

        for dropped in initial_data.keys() {
            log::warn!("Ignoring data for unregistered collection {}", dropped);
        }

        Self {
            data: RwLock::new(data),
            persistence,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Number of records in a collection.
    pub fn len(&self, collection: Collection) -> Result<usize> {
        let data = self.read()?;
        Ok(partition(&data, collection)?.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreData>> {
        self.data
            .read()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreData>> {
        self.data
            .write()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))
    }

    async fn persist(&self, collection: Collection) -> Result<()> {
        let Some(p) = &self.persistence else {
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;
        let snapshot = partition(&*self.read()?, collection)?.clone();
        let p = p.clone();

        tokio::task::spawn_blocking(move || p.save_collection(collection, &snapshot))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?
            .map_err(|e| {
                log::error!("Failed to persist collection {}: {}", collection, e);
                e
            })
    }
}

fn partition(data: &StoreData, collection: Collection) -> Result<&CollectionData> {
    data.get(&collection)
        .ok_or_else(|| Error::UnknownCollection(collection.to_string()))
}

#[async_trait]
impl KVReader for MemStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<serde_json::Value>> {
        let data = self.read()?;
        Ok(partition(&data, collection)?.get(id).cloned())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<serde_json::Value>> {
        let data = self.read()?;
        Ok(partition(&data, collection)?.values().cloned().collect())
    }
}

#[async_trait]
impl KVWriter for MemStore {
    async fn put(&self, collection: Collection, id: &str, value: serde_json::Value) -> Result<()> {
        {
            let mut data = self.write()?;
            let records = data
                .get_mut(&collection)
                .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
            records.insert(id.to_string(), value);
        }
        self.persist(collection).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        {
            let mut data = self.write()?;
            let records = data
                .get_mut(&collection)
                .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
            records.remove(id);
        }
        self.persist(collection).await
    }
}
