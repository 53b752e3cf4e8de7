// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Lazy upgrade of historical storage layouts.
//!
//! A collection is read from the first source in its chain whose value has
//! the expected shape. The current key answers even when it holds an empty
//! collection; legacy keys must hold data. Legacy keys are only ever read,
//! so a downgrade can still find its data.

use crate::keys::StorageKey;
use crate::store::KvStore;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Stamped onto legacy records that predate a field.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    pub default_account_id: String,
    pub default_currency: String,
}

impl Default for MigrationContext {
    fn default() -> Self {
        Self {
            default_account_id: crate::entities::DEFAULT_ACCOUNT_ID.to_string(),
            default_currency: "USD".to_string(),
        }
    }
}

impl MigrationContext {
    /// Uses the stored currency preference when there is one.
    pub fn from_store(store: &KvStore) -> Self {
        let mut ctx = Self::default();
        if let Some(Value::String(ccy)) = load_value(store, StorageKey::Currency, &ctx)
            .map(|m| m.value)
            .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
        {
            ctx.default_currency = ccy.trim().to_uppercase();
        }
        ctx
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    NonEmptyArray,
    NonEmptyObject,
    /// Any non-null value.
    Present,
}

impl Shape {
    /// `current` relaxes the non-empty rule for the canonical key, so an
    /// emptied collection stays empty.
    fn accepts(self, v: &Value, current: bool) -> bool {
        match self {
            Shape::NonEmptyArray => v.as_array().is_some_and(|a| current || !a.is_empty()),
            Shape::NonEmptyObject => v.as_object().is_some_and(|o| current || !o.is_empty()),
            Shape::Present => !v.is_null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    Identity,
    Transactions,
}

impl Normalizer {
    fn apply(self, v: Value, ctx: &MigrationContext) -> Value {
        match self {
            Normalizer::Identity => v,
            Normalizer::Transactions => normalize_transactions(v, ctx),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeySource {
    pub key: &'static str,
    pub shape: Shape,
    pub normalizer: Normalizer,
}

/// The ordered fallback chain for `key`.
pub fn sources(key: StorageKey) -> Vec<KeySource> {
    let (shape, normalizer) = match key {
        StorageKey::Transactions => (Shape::NonEmptyArray, Normalizer::Transactions),
        StorageKey::RecurringRules
        | StorageKey::Accounts
        | StorageKey::Categories
        | StorageKey::Goals
        | StorageKey::RecurringPayments => (Shape::NonEmptyArray, Normalizer::Identity),
        StorageKey::Budgets => (Shape::NonEmptyObject, Normalizer::Identity),
        StorageKey::Theme
        | StorageKey::Currency
        | StorageKey::PrivacyMode
        | StorageKey::Onboarding => (Shape::Present, Normalizer::Identity),
    };
    key.names()
        .iter()
        .map(|k| KeySource {
            key: k,
            shape,
            normalizer,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Migrated {
    pub value: Value,
    pub source: &'static str,
    /// True when the value came from a legacy key.
    pub from_legacy: bool,
}

pub fn load_value(store: &KvStore, key: StorageKey, ctx: &MigrationContext) -> Option<Migrated> {
    for (idx, src) in sources(key).into_iter().enumerate() {
        let Some(v) = store.get_value(src.key) else {
            continue;
        };
        if !src.shape.accepts(&v, idx == 0) {
            continue;
        }
        if idx == 0 {
            // Current data is returned untouched.
            return Some(Migrated {
                value: v,
                source: src.key,
                from_legacy: false,
            });
        }
        tracing::debug!(collection = ?key, source = src.key, "loading from legacy key");
        return Some(Migrated {
            value: src.normalizer.apply(v, ctx),
            source: src.key,
            from_legacy: true,
        });
    }
    None
}

/// Loads and deserializes a collection, falling through to the next source
/// when one fails to deserialize.
pub fn load<T: DeserializeOwned>(
    store: &KvStore,
    key: StorageKey,
    ctx: &MigrationContext,
) -> Option<T> {
    for (idx, src) in sources(key).into_iter().enumerate() {
        let Some(v) = store.get_value(src.key) else {
            continue;
        };
        if !src.shape.accepts(&v, idx == 0) {
            continue;
        }
        let v = if idx == 0 { v } else { src.normalizer.apply(v, ctx) };
        match serde_json::from_value::<T>(v) {
            Ok(parsed) => {
                if idx > 0 {
                    tracing::debug!(collection = ?key, source = src.key, "migrated legacy data");
                }
                return Some(parsed);
            }
            Err(e) => {
                tracing::warn!(source = src.key, error = %e, "stored data has an unexpected shape");
            }
        }
    }
    None
}

/// True when any name in the chain holds a value, empty or not.
pub fn any_source_present(store: &KvStore, key: StorageKey) -> bool {
    key.names().iter().any(|k| store.contains(k))
}

fn normalize_transactions(v: Value, ctx: &MigrationContext) -> Value {
    let Value::Array(items) = v else {
        return v;
    };
    let items = items
        .into_iter()
        .map(|item| {
            let Value::Object(mut obj) = item else {
                return item;
            };
            if !obj.get("accountId").is_some_and(|a| a.is_string()) {
                obj.insert(
                    "accountId".into(),
                    Value::String(ctx.default_account_id.clone()),
                );
            }
            if !obj.get("currency").is_some_and(|c| c.is_string()) {
                obj.insert(
                    "currency".into(),
                    Value::String(ctx.default_currency.clone()),
                );
            }
            if !obj.contains_key("isRecurring") {
                obj.insert("isRecurring".into(), Value::Bool(false));
            }
            if let Some(Value::String(date)) = obj.get_mut("date") {
                // Older builds stored full timestamps.
                if date.len() > 10 && date.is_char_boundary(10) {
                    date.truncate(10);
                }
            }
            Value::Object(obj)
        })
        .collect();
    Value::Array(items)
}
