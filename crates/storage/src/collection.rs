// SPDX-License-Identifier: MIT

//! Shared persistence core for the aggregate stores.
//!
//! A `Collection<T>` is an in-memory `HashMap<String, T>` loaded from one
//! JSON file and rewritten atomically (temp file + rename) after every
//! mutation. All access goes through the collection lock, which is what
//! serializes writers to one aggregate type.

use crate::error::StoreError;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub(crate) struct Collection<T> {
    path: PathBuf,
    entries: Mutex<HashMap<String, T>>,
}

impl<T> Collection<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Load the collection file, treating a missing file as empty.
    pub fn open(state_dir: &Path, file_name: &str) -> Result<Self, StoreError> {
        let path = state_dir.join(file_name);
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                StoreError::Corrupt { path: path.clone(), detail: source.to_string() }
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(StoreError::Io { path, detail: err.to_string() });
            }
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.entries.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Snapshot of all entries (unordered).
    pub fn all(&self) -> Vec<T> {
        self.entries.lock().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Insert or replace, then persist.
    pub fn put(&self, id: &str, value: T) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.insert(id.to_string(), value);
        self.persist(&entries)
    }

    /// Replace only if present, then persist. Returns false when absent.
    pub fn replace(&self, id: &str, value: T) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(id) {
            return Ok(false);
        }
        entries.insert(id.to_string(), value);
        self.persist(&entries)?;
        Ok(true)
    }

    /// Remove, then persist. Returns false when absent.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock();
        if entries.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&entries)?;
        Ok(true)
    }

    /// Remove every entry matching the predicate, then persist if any went.
    pub fn remove_where(&self, mut pred: impl FnMut(&T) -> bool) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, v| !pred(v));
        let removed = before - entries.len();
        if removed > 0 {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    fn persist(&self, entries: &HashMap<String, T>) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            detail: source.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|source| StoreError::Io { path: self.path.clone(), detail: source.to_string() })
    }
}
