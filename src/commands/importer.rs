// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{required, resolve_account};
use crate::entities::AccountBook;
use crate::interchange::csv_import::{import_csv, ImportOptions};
use crate::migrate::MigrationContext;
use crate::repository::TransactionRepository;
use crate::store::KvStore;
use crate::utils::pretty_table;
use anyhow::{bail, Context, Result};
use std::fs;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(store, sub),
        _ => Ok(()),
    }
}

fn import_transactions(store: &KvStore, sub: &clap::ArgMatches) -> Result<()> {
    let path = required(sub, "path")?;
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;

    let ctx = MigrationContext::from_store(store);
    let accounts = AccountBook::load(store, &ctx);
    let account_id = resolve_account(&accounts, sub.get_one::<String>("account"))?;
    let currency = accounts
        .get(&account_id)
        .map(|a| a.currency.clone())
        .unwrap_or_else(|| ctx.default_currency.clone());
    let opts = ImportOptions {
        account_id,
        currency,
        max_rows: sub.get_one::<usize>("limit").copied(),
    };

    let result = import_csv(&text, &opts);
    if !result.errors.is_empty() {
        let rows = result
            .errors
            .iter()
            .map(|e| {
                vec![
                    e.row.to_string(),
                    e.field.clone(),
                    e.message.clone(),
                    e.value.clone(),
                ]
            })
            .collect();
        eprintln!("{}", pretty_table(&["Row", "Field", "Problem", "Value"], rows));
    }
    if !result.success {
        bail!("Nothing to import from {}", path);
    }

    if sub.get_flag("dry-run") {
        println!(
            "Dry run: {} row(s) would be imported, {} rejected",
            result.imported_count,
            result.errors.len()
        );
        return Ok(());
    }

    let mut repo = TransactionRepository::load(store, &ctx);
    for draft in result.preview {
        repo.add(draft);
    }
    repo.flush().into_result()?;
    println!(
        "Imported {} transaction(s), {} row(s) rejected",
        result.imported_count,
        result.errors.len()
    );
    Ok(())
}
