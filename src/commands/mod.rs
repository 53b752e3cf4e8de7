// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod backup;
pub mod bills;
pub mod budgets;
pub mod categories;
pub mod exporter;
pub mod goals;
pub mod importer;
pub mod recurring;
pub mod restore;
pub mod settings;
pub mod transactions;

use crate::entities::{AccountBook, CategoryBook};
use crate::migrate::MigrationContext;
use crate::store::KvStore;
use anyhow::{anyhow, Result};
use clap::ArgMatches;

/// Seeds first-run defaults.
pub fn init(store: &KvStore) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let accounts = AccountBook::load(store, &ctx);
    let categories = CategoryBook::load(store, &ctx);
    println!(
        "Ready: {} account(s), {} categories",
        accounts.list().len(),
        categories.list().len()
    );
    Ok(())
}

/// Resolves `--account` (id or name) to an account id, defaulting to the
/// first account.
pub(crate) fn resolve_account(accounts: &AccountBook<'_>, wanted: Option<&String>) -> Result<String> {
    match wanted {
        Some(w) => accounts
            .find(w.trim())
            .map(|a| a.id.clone())
            .ok_or_else(|| anyhow!("Account '{}' not found", w)),
        None => accounts
            .list()
            .first()
            .map(|a| a.id.clone())
            .ok_or_else(|| anyhow!("No accounts exist; add one first")),
    }
}

pub(crate) fn parse_tags(raw: Option<&String>) -> Vec<String> {
    raw.map(|s| {
        s.split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub(crate) fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a String> {
    m.get_one::<String>(name)
        .ok_or_else(|| anyhow!("--{} is required", name))
}
