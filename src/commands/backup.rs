// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::interchange::backup::{create_backup, restore_backup};
use crate::store::KvStore;
use anyhow::{Context, Result};
use std::fs;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => {
            let out = required(sub, "out")?;
            let doc = create_backup(store);
            fs::write(out, serde_json::to_string_pretty(&doc)?)
                .with_context(|| format!("Failed to write {}", out))?;
            println!("Backed up {} key(s) to {}", doc.data.len(), out);
        }
        Some(("restore", sub)) => {
            let path = required(sub, "path")?;
            let json =
                fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
            let report = restore_backup(&json, store)
                .with_context(|| format!("Restore from {} failed; existing data is unchanged", path))?;
            println!("Restored {} key(s)", report.restored.len());
            if !report.ignored.is_empty() {
                println!("Ignored unknown keys: {}", report.ignored.join(", "));
            }
        }
        _ => {}
    }
    Ok(())
}
