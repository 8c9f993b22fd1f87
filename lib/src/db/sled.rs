use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::{config, error::ErrorKind, Result};

use super::{decode, encode, Collectable, Identifiable};

#[derive(Clone, Debug)]
pub struct SledDb {
    inner: sled::Db,
    writes: Arc<Mutex<()>>,
}

impl SledDb {
    /// Opens the database at the default location.
    pub fn new() -> Result<Self> {
        Self::open(&config::Db::default())
    }

    pub fn open(config: &config::Db) -> Result<Self> {
        let inner = if config.temporary {
            sled::Config::new().temporary(true).open()?
        } else {
            sled::Config::default().path(&config.path).open()?
        };
        Ok(Self {
            inner,
            writes: Arc::default(),
        })
    }

    /// Opens a throwaway database, removed from disk once dropped.
    pub fn temporary() -> Result<Self> {
        Self::open(&config::Db {
            temporary: true,
            ..Default::default()
        })
    }

    pub fn get_collection<T: DeserializeOwned + Collectable>(&self) -> Result<Vec<T>> {
        self.get_collection_at(T::get_collection_name())
    }

    /// Gets a collection of entries of the same type from the collection
    /// specified by name.
    pub fn get_collection_at<T: DeserializeOwned>(&self, name: impl AsRef<[u8]>) -> Result<Vec<T>> {
        let tree = self.inner.open_tree(name)?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, value_bytes) = entry?;
            let value: T = decode(&value_bytes)?;
            out.push(value);
        }
        Ok(out)
    }

    /// Returns the first entry of the collection matching the predicate.
    pub fn find<T: DeserializeOwned + Collectable>(
        &self,
        predicate: impl Fn(&T) -> bool,
    ) -> Result<Option<T>> {
        let tree = self.inner.open_tree(T::get_collection_name())?;
        for entry in tree.iter() {
            let (_, value_bytes) = entry?;
            let value: T = decode(&value_bytes)?;
            if predicate(&value) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Returns the length of the collection as defined for the specified type.
    pub fn len<T: Collectable>(&self) -> Result<usize> {
        Ok(self.inner.open_tree(T::get_collection_name())?.len())
    }

    /// Gets an item from the collection defined for the item type.
    pub fn get<T: DeserializeOwned + Collectable>(&self, id: Uuid) -> Result<T> {
        self.get_at(T::get_collection_name(), id)
    }

    /// Gets an item by id from the collection specified by name.
    pub fn get_at<T: DeserializeOwned>(&self, collection: &str, id: Uuid) -> Result<T> {
        let tree = self.inner.open_tree(collection)?;
        match tree.get(id.as_bytes())? {
            Some(value_bytes) => decode(&value_bytes),
            None => Err(ErrorKind::NotFound(format!(
                "entity with id '{}' not found in collection {}",
                id, collection
            ))
            .into()),
        }
    }

    pub fn set<T: Serialize + Identifiable + Collectable>(&self, value: &T) -> Result<()> {
        self.set_raw_at(T::get_collection_name(), value, value.get_id())
    }

    pub fn set_raw_at<T: Serialize>(
        &self,
        collection: impl AsRef<[u8]>,
        value: &T,
        id: Uuid,
    ) -> Result<()> {
        let tree = self.inner.open_tree(collection)?;
        let encoded = encode(value)?;
        tree.insert(id.as_bytes(), encoded)?;
        Ok(())
    }

    pub fn remove<T: Identifiable + Collectable>(&self, value: &T) -> Result<()> {
        self.remove_by_id::<T>(value.get_id()).map(|_| ())
    }

    /// Removes the entry with the given id. Returns whether anything was
    /// removed.
    pub fn remove_by_id<T: Collectable>(&self, id: Uuid) -> Result<bool> {
        self.remove_at(T::get_collection_name(), id)
    }

    pub fn remove_at(&self, collection: &str, id: Uuid) -> Result<bool> {
        let tree = self.inner.open_tree(collection)?;
        Ok(tree.remove(id.as_bytes())?.is_some())
    }

    /// Atomically increments the counter kept under `id` in the named tree
    /// and returns the new value.
    pub fn increment_at(&self, collection: &str, id: Uuid) -> Result<u64> {
        let tree = self.inner.open_tree(collection)?;
        let value = tree.update_and_fetch(id.as_bytes(), |old| {
            Some((counter_value(old) + 1).to_be_bytes().to_vec())
        })?;
        Ok(counter_value(value.as_deref()))
    }

    /// Current value of a counter, zero when it was never incremented.
    pub fn counter_at(&self, collection: &str, id: Uuid) -> Result<u64> {
        let tree = self.inner.open_tree(collection)?;
        Ok(counter_value(tree.get(id.as_bytes())?.as_deref()))
    }

    pub fn clear_at(&self, collection: &str) -> Result<()> {
        let tree = self.inner.open_tree(collection)?;
        tree.clear()?;
        Ok(())
    }

    pub fn clear<T: Collectable>(&self) -> Result<()> {
        self.clear_at(T::get_collection_name())
    }

    /// Runs `f` holding the write lock shared by every clone of this handle.
    /// Read-check-write sequences go through here so they can't interleave.
    pub fn write_locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self.writes.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }

    /// Flushes dirty buffers to disk.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

fn counter_value(bytes: Option<&[u8]>) -> u64 {
    bytes
        .and_then(|b| <[u8; 8]>::try_from(b).ok())
        .map(u64::from_be_bytes)
        .unwrap_or(0)
}
