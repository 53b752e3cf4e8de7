// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::interchange::restore::{restore_archive, stage_archive, RestoreOptions, RestoreReport};
use crate::store::KvStore;
use anyhow::{Context, Result};
use std::fs;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let Some(("archive", sub)) = m.subcommand() else {
        return Ok(());
    };
    let path = required(sub, "path")?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    let opts = RestoreOptions {
        max_transactions: sub.get_one::<usize>("limit").copied(),
    };

    if sub.get_flag("dry-run") {
        let (_, report) = stage_archive(&bytes, &opts)
            .with_context(|| format!("{} is not a valid archive", path))?;
        print_report(&report);
        println!("Dry run: nothing was written");
        return Ok(());
    }

    let report = restore_archive(&bytes, store, &opts)
        .with_context(|| format!("Restore from {} failed; existing data is unchanged", path))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RestoreReport) {
    println!("Restored: {}", report.restored.join(", "));
    if !report.skipped.is_empty() {
        println!("Not in archive (kept as is): {}", report.skipped.join(", "));
    }
    println!("{} transaction(s)", report.transactions);
    if report.truncated > 0 {
        println!("{} transaction(s) dropped by the row limit", report.truncated);
    }
}
