// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::entities::CategoryBook;
use crate::migrate::MigrationContext;
use crate::store::KvStore;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{bail, Result};

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut book = CategoryBook::load(store, &ctx);
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required(sub, "name")?;
            let icon = required(sub, "icon")?;
            let color = required(sub, "color")?;
            let category = book.add(name, icon, color)?;
            println!("Added category '{}' (id={})", category.name, category.id);
        }
        Some(("list", sub)) => {
            if !maybe_print_json(sub.get_flag("json"), &book.list())? {
                let rows = book
                    .list()
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.clone(),
                            format!("{} {}", c.icon, c.name),
                            c.color.clone(),
                            if c.is_default { "default" } else { "custom" }.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Name", "Color", "Kind"], rows));
            }
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            if !book.delete(id) {
                bail!("Cannot remove category '{}' (unknown or built in)", id);
            }
            println!("Removed category '{}'", id);
        }
        _ => {}
    }
    Ok(())
}
