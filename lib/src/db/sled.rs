use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{IVec, Tree};
use uuid::Uuid;

use crate::{error::ErrorKind, Config, Result};

use super::{decode, encode, trees, Collectable, Identifiable};

#[derive(Clone, Debug)]
pub struct SledDb {
    inner: sled::Db,
}

impl SledDb {
    /// Opens the database at the default `./db` location.
    pub fn new() -> Result<Self> {
        Self::open("./db")
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = sled::Config::default().path(path).open()?;
        Ok(Self { inner })
    }

    /// Opens the database as described by the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.dev.enabled && config.dev.temporary_db {
            Self::temporary()
        } else {
            Self::open(&config.db.path)
        }
    }

    /// Opens a throwaway database that gets removed once dropped.
    pub fn temporary() -> Result<Self> {
        let inner = sled::Config::new().temporary(true).open()?;
        Ok(Self { inner })
    }

    /// Runs a blocking store closure off the async executor, bounded by
    /// `timeout`.
    ///
    /// On timeout the closure is abandoned, not rolled back: whatever it
    /// already wrote stays written.
    pub async fn call<T, F>(&self, timeout: Duration, f: F) -> Result<T>
    where
        F: FnOnce(&SledDb) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        let task = tokio::task::spawn_blocking(move || f(&db));
        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(ErrorKind::Timeout(timeout).into()),
        }
    }

    /// Opens all the keyed trees up front. Their key layouts provide the
    /// uniqueness and ordering the engagement logic relies on.
    pub fn ensure_indexes(&self) -> Result<()> {
        for name in trees::ALL {
            self.inner.open_tree(name)?;
        }
        tracing::info!(trees = ?trees::ALL, "engagement indexes ensured");
        Ok(())
    }

    pub fn flush(&self) -> Result<usize> {
        Ok(self.inner.flush()?)
    }

    fn tree(&self, name: &str) -> Result<Tree> {
        Ok(self.inner.open_tree(name)?)
    }

    /// Gets all entries of the collection defined for the type.
    pub fn get_collection<T: DeserializeOwned + Collectable>(&self) -> Result<Vec<T>> {
        let tree = self.tree(T::get_collection_name())?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, value_bytes) = entry?;
            out.push(decode(&value_bytes)?);
        }
        Ok(out)
    }

    /// Returns the first entry of the collection matching the predicate.
    pub fn find<T, P>(&self, predicate: P) -> Result<Option<T>>
    where
        T: DeserializeOwned + Collectable,
        P: Fn(&T) -> bool,
    {
        let tree = self.tree(T::get_collection_name())?;
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
        Ok(self.tree(T::get_collection_name())?.len())
    }

    /// Gets an item from the collection defined for the item type. Missing
    /// items are reported as `NotFound`.
    pub fn get<T: DeserializeOwned + Collectable>(&self, id: Uuid) -> Result<T> {
        self.try_get(id)?
            .ok_or_else(|| ErrorKind::not_found(T::get_collection_name()).into())
    }

    pub fn try_get<T: DeserializeOwned + Collectable>(&self, id: Uuid) -> Result<Option<T>> {
        self.get_key(T::get_collection_name(), id.as_bytes())
    }

    pub fn set<T: Serialize + Identifiable + Collectable>(&self, value: &T) -> Result<()> {
        self.put_key(T::get_collection_name(), value.get_id().as_bytes(), value)
    }

    /// Removes the item with the given id. Returns whether it existed.
    pub fn remove<T: Collectable>(&self, id: Uuid) -> Result<bool> {
        self.remove_key(T::get_collection_name(), id.as_bytes())
    }

    pub fn clear<T: Collectable>(&self) -> Result<()> {
        self.tree(T::get_collection_name())?.clear()?;
        Ok(())
    }

    pub fn get_key<T: DeserializeOwned>(&self, tree: &str, key: &[u8]) -> Result<Option<T>> {
        match self.tree(tree)?.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_key<T: Serialize>(&self, tree: &str, key: &[u8], value: &T) -> Result<()> {
        self.tree(tree)?.insert(key, encode(value)?)?;
        Ok(())
    }

    pub fn contains_key(&self, tree: &str, key: &[u8]) -> Result<bool> {
        Ok(self.tree(tree)?.contains_key(key)?)
    }

    /// Atomically inserts the value unless the key is already taken.
    ///
    /// Returns `true` if this call created the entry. Of any number of
    /// concurrent callers racing on the same key exactly one wins.
    pub fn insert_if_absent<T: Serialize>(&self, tree: &str, key: &[u8], value: &T) -> Result<bool> {
        let swapped = self
            .tree(tree)?
            .compare_and_swap(key, None::<&[u8]>, Some(encode(value)?))?;
        Ok(swapped.is_ok())
    }

    /// Removes the entry if present. Returns `true` if this call removed it.
    pub fn remove_key(&self, tree: &str, key: &[u8]) -> Result<bool> {
        Ok(self.tree(tree)?.remove(key)?.is_some())
    }

    /// Atomically applies `f` to the document stored under `key`, starting
    /// from `T::default()` when absent, and returns the stored result.
    ///
    /// `f` may run more than once under contention, each time against the
    /// freshest stored value.
    pub fn update_key<T, F>(&self, tree: &str, key: &[u8], mut f: F) -> Result<T>
    where
        T: Default + Serialize + DeserializeOwned,
        F: FnMut(&mut T),
    {
        let tree = self.tree(tree)?;
        let mut failure = None;
        let updated = tree.update_and_fetch(key, |current| {
            let mut value = match current.map(decode::<T>).transpose() {
                Ok(value) => value.unwrap_or_default(),
                Err(e) => {
                    failure = Some(e);
                    return current.map(<[u8]>::to_vec);
                }
            };
            f(&mut value);
            match encode(&value) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    failure = Some(e);
                    current.map(<[u8]>::to_vec)
                }
            }
        })?;
        if let Some(e) = failure {
            return Err(e);
        }
        match updated {
            Some(bytes) => decode(&bytes),
            None => Err(ErrorKind::DbError("atomic update left no value behind".to_string()).into()),
        }
    }

    pub fn count_prefix(&self, tree: &str, prefix: &[u8]) -> Result<usize> {
        let mut count = 0;
        for key in self.tree(tree)?.scan_prefix(prefix).keys() {
            key?;
            count += 1;
        }
        Ok(count)
    }

    /// Decodes a page of the entries sharing `prefix`, in key order or in
    /// reverse key order.
    pub fn scan_prefix<T: DeserializeOwned>(
        &self,
        tree: &str,
        prefix: &[u8],
        reverse: bool,
        skip: usize,
        take: usize,
    ) -> Result<Vec<T>> {
        let iter = self.tree(tree)?.scan_prefix(prefix);
        let entries: Box<dyn Iterator<Item = sled::Result<(IVec, IVec)>>> = if reverse {
            Box::new(iter.rev())
        } else {
            Box::new(iter)
        };
        entries
            .skip(skip)
            .take(take)
            .map(|entry| {
                let (_, value) = entry?;
                decode(&value)
            })
            .collect()
    }

    /// Returns the key and value of the first entry under `prefix` that
    /// matches the predicate.
    pub fn find_in_prefix<T, P>(
        &self,
        tree: &str,
        prefix: &[u8],
        predicate: P,
    ) -> Result<Option<(IVec, T)>>
    where
        T: DeserializeOwned,
        P: Fn(&T) -> bool,
    {
        for entry in self.tree(tree)?.scan_prefix(prefix) {
            let (key, bytes) = entry?;
            let value: T = decode(&bytes)?;
            if predicate(&value) {
                return Ok(Some((key, value)));
            }
        }
        Ok(None)
    }

    /// Removes every entry under `prefix`. Returns how many were removed.
    pub fn remove_prefix(&self, tree: &str, prefix: &[u8]) -> Result<usize> {
        let tree = self.tree(tree)?;
        let mut keys = Vec::new();
        for key in tree.scan_prefix(prefix).keys() {
            keys.push(key?);
        }
        let mut removed = 0;
        for key in keys {
            if tree.remove(key)?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
