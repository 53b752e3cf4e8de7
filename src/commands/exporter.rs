// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::interchange::archive::{
    export_archive, export_transactions_csv, DataSnapshot, ExportMeta,
};
use crate::migrate::MigrationContext;
use crate::store::KvStore;
use anyhow::{Context, Result};
use std::fs;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let out = required(sub, "out")?;
            let snap = DataSnapshot::load(store, &ctx);
            let csv = export_transactions_csv(&snap.transactions, &snap.settings.currency)?;
            fs::write(out, csv).with_context(|| format!("Failed to write {}", out))?;
            println!("Exported {} transaction(s) to {}", snap.transactions.len(), out);
        }
        Some(("archive", sub)) => {
            let out = required(sub, "out")?;
            let snap = DataSnapshot::load(store, &ctx);
            let bytes = export_archive(&snap, &ExportMeta::default())?;
            fs::write(out, bytes).with_context(|| format!("Failed to write {}", out))?;
            println!("Wrote archive {}", out);
        }
        _ => {}
    }
    Ok(())
}
