// Transaction cache - buffers one transaction's writes over committed state
//
// Reads see the transaction's own writes first. Nothing reaches the parent
// store until the batch produced by `into_batch` is applied, so dropping the
// cache rolls the whole transaction back.

use crate::storage::{KvRead, StoreError, WriteBatch};
use std::collections::BTreeMap;

pub struct TxCache<'a> {
    parent: &'a dyn KvRead,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> TxCache<'a> {
    pub fn new(parent: &'a dyn KvRead) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    /// Number of buffered writes (including deletes)
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Convert buffered writes into an ordered batch for the parent store
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (key, value) in self.writes {
            match value {
                Some(value) => batch.put(key, value),
                None => batch.delete(key),
            }
        }
        batch
    }
}

impl KvRead for TxCache<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.parent.get(key),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.scan_prefix(prefix)?.into_iter().collect();

        let overlay = self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, value) in overlay {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}
