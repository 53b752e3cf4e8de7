// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Whole-store JSON snapshot.

use crate::keys::StorageKey;
use crate::migrate::{self, MigrationContext};
use crate::store::{put_op, BatchOp, KvStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const BACKUP_VERSION: &str = "2";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("backup contains no data")]
    Empty,
    #[error("backup has no keys this app knows: {0:?}")]
    NoKnownKeys(Vec<String>),
    #[error("could not write restored data: {0}")]
    Commit(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub data: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupRestoreReport {
    /// Canonical keys written.
    pub restored: Vec<String>,
    /// Document keys with no known collection.
    pub ignored: Vec<String>,
    pub reload_required: bool,
}

/// Every collection as the app currently loads it, written under its
/// canonical key. Data still held under a legacy name is included.
pub fn create_backup(store: &KvStore) -> BackupDocument {
    let ctx = MigrationContext::from_store(store);
    let data = StorageKey::ALL
        .into_iter()
        .filter_map(|k| {
            migrate::load_value(store, k, &ctx).map(|m| (k.canonical().to_string(), m.value))
        })
        .collect();
    BackupDocument {
        version: BACKUP_VERSION.to_string(),
        timestamp: Utc::now(),
        data,
    }
}

/// Clears every known key, current and legacy, then writes the document's
/// contents. Keys written under an older product name are mapped onto the
/// current name through the alias table; when a document carries several
/// names for one collection the highest-priority name wins.
pub fn restore_backup(json: &str, store: &KvStore) -> Result<BackupRestoreReport, BackupError> {
    let doc: BackupDocument = serde_json::from_str(json)?;
    if doc.data.is_empty() {
        return Err(BackupError::Empty);
    }

    let mut report = BackupRestoreReport::default();
    let mut resolved: BTreeMap<StorageKey, (usize, Value)> = BTreeMap::new();
    for (name, value) in doc.data {
        let Some(key) = StorageKey::resolve(&name) else {
            tracing::warn!(key = %name, "backup key has no known collection, ignoring");
            report.ignored.push(name);
            continue;
        };
        let priority = key.names().iter().position(|n| *n == name).unwrap_or(usize::MAX);
        match resolved.get(&key) {
            Some((held, _)) if *held <= priority => continue,
            _ => {
                resolved.insert(key, (priority, value));
            }
        }
    }

    if resolved.is_empty() {
        return Err(BackupError::NoKnownKeys(report.ignored));
    }

    // Legacy names go too, or the migrator would resurrect them.
    let mut batch: Vec<BatchOp> = StorageKey::ALL
        .into_iter()
        .flat_map(|k| k.names().iter())
        .map(|name| BatchOp::Delete(name.to_string()))
        .collect();
    for (key, (_, value)) in &resolved {
        batch.push(put_op(key.canonical(), value)?);
        report.restored.push(key.canonical().to_string());
    }
    store.commit(&batch).into_result()?;
    report.reload_required = true;
    tracing::info!(keys = report.restored.len(), "backup restored");
    Ok(report)
}
