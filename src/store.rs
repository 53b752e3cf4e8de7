// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Key/value persistence boundary.
//!
//! Every collection is stored as one JSON document under one key. The
//! [`KvStore`] adapter is the only component that talks to a
//! [`StorageMedium`]; reads never fail (they fall back) and writes are best
//! effort, but every failed write is reported through [`WriteStatus`] and the
//! store's failure counters.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),
    #[error("storage quota exceeded writing '{key}' ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
    #[error("could not serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One step of an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put(String, String),
    Delete(String),
}

/// The raw device-local medium. Values are JSON text.
pub trait StorageMedium {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
    /// Applies every op or none of them.
    fn apply(&self, batch: &[BatchOp]) -> Result<(), StoreError>;
}

/// SQLite-backed medium: a single `kv` table.
pub struct SqliteMedium {
    conn: Connection,
}

impl SqliteMedium {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl StorageMedium for SqliteMedium {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let v = self
            .conn
            .query_row("SELECT value FROM kv WHERE key=?1", params![key], |r| {
                r.get::<_, String>(0)
            })
            .optional()?;
        Ok(v)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key=?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn apply(&self, batch: &[BatchOp]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for op in batch {
            match op {
                BatchOp::Put(key, value) => {
                    tx.execute(
                        "INSERT INTO kv(key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
                        params![key, value],
                    )?;
                }
                BatchOp::Delete(key) => {
                    tx.execute("DELETE FROM kv WHERE key=?1", params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// In-process medium. An optional byte quota emulates a full disk or a
/// browser storage limit.
#[derive(Default)]
pub struct MemoryMedium {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    fn used_without(entries: &BTreeMap<String, String>, key: &str) -> usize {
        entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn check_quota(
        &self,
        entries: &BTreeMap<String, String>,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let used = Self::used_without(entries, key);
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }
        Ok(())
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.borrow_mut();
        self.check_quota(&entries, key, value)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }

    fn apply(&self, batch: &[BatchOp]) -> Result<(), StoreError> {
        // Work on a copy so a quota failure halfway leaves nothing behind.
        let mut staged = self.entries.borrow().clone();
        for op in batch {
            match op {
                BatchOp::Put(key, value) => {
                    self.check_quota(&staged, key, value)?;
                    staged.insert(key.clone(), value.clone());
                }
                BatchOp::Delete(key) => {
                    staged.remove(key);
                }
            }
        }
        *self.entries.borrow_mut() = staged;
        Ok(())
    }
}

/// Outcome of a best-effort write.
#[derive(Debug)]
pub enum WriteStatus {
    Persisted,
    Failed(StoreError),
}

impl WriteStatus {
    pub fn is_persisted(&self) -> bool {
        matches!(self, WriteStatus::Persisted)
    }

    pub fn into_result(self) -> Result<(), StoreError> {
        match self {
            WriteStatus::Persisted => Ok(()),
            WriteStatus::Failed(e) => Err(e),
        }
    }
}

pub struct KvStore {
    medium: Box<dyn StorageMedium>,
    failures: Cell<usize>,
    last_error: RefCell<Option<String>>,
}

impl KvStore {
    pub fn new(medium: impl StorageMedium + 'static) -> Self {
        Self {
            medium: Box::new(medium),
            failures: Cell::new(0),
            last_error: RefCell::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryMedium::new())
    }

    /// Reads `key` and deserializes it, returning `fallback` when the key is
    /// missing or does not hold a valid `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let Some(raw) = self.read_raw(key) else {
            return fallback;
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value is malformed, using fallback");
                fallback
            }
        }
    }

    /// Raw parsed JSON under `key`, `None` when missing or malformed.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value is not valid JSON");
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read_raw(key).is_some()
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.medium.read(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed");
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> WriteStatus {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(source) => {
                return self.record(StoreError::Serialize {
                    key: key.to_string(),
                    source,
                });
            }
        };
        match self.medium.write(key, &json) {
            Ok(()) => WriteStatus::Persisted,
            Err(e) => self.record(e),
        }
    }

    pub fn remove(&self, key: &str) -> WriteStatus {
        match self.medium.delete(key) {
            Ok(()) => WriteStatus::Persisted,
            Err(e) => self.record(e),
        }
    }

    /// Applies `batch` atomically.
    pub fn commit(&self, batch: &[BatchOp]) -> WriteStatus {
        match self.medium.apply(batch) {
            Ok(()) => WriteStatus::Persisted,
            Err(e) => self.record(e),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        match self.medium.keys() {
            Ok(k) => k,
            Err(e) => {
                tracing::warn!(error = %e, "could not list storage keys");
                Vec::new()
            }
        }
    }

    /// Number of writes that failed since the store was opened.
    pub fn write_failures(&self) -> usize {
        self.failures.get()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    fn record(&self, err: StoreError) -> WriteStatus {
        tracing::warn!(error = %err, "storage write failed, change kept in memory only");
        self.failures.set(self.failures.get() + 1);
        *self.last_error.borrow_mut() = Some(err.to_string());
        WriteStatus::Failed(err)
    }
}

/// Serializes `value` into a batch `Put`.
pub fn put_op<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<BatchOp, StoreError> {
    let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })?;
    Ok(BatchOp::Put(key.to_string(), json))
}
