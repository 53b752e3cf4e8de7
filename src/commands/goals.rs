// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::entities::{GoalBook, GoalDraft};
use crate::migrate::MigrationContext;
use crate::store::KvStore;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{anyhow, bail, Result};

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut book = GoalBook::load(store, &ctx);
    match m.subcommand() {
        Some(("add", sub)) => {
            let goal = book.add(GoalDraft {
                name: required(sub, "name")?.clone(),
                target_amount: parse_decimal(required(sub, "target")?)?,
                current_amount: parse_decimal(required(sub, "current")?)?,
                deadline: sub
                    .get_one::<String>("deadline")
                    .map(|s| parse_date(s))
                    .transpose()?,
                category: required(sub, "category")?.clone(),
                description: sub.get_one::<String>("description").cloned().unwrap_or_default(),
            })?;
            println!("Added goal '{}' (id={})", goal.name, goal.id);
        }
        Some(("set", sub)) | Some(("contribute", sub)) => {
            let id = required(sub, "id")?;
            let amount = parse_decimal(required(sub, "amount")?)?;
            let goal = if m.subcommand_name() == Some("set") {
                book.set_current(id, amount)
            } else {
                book.contribute(id, amount)
            }
            .ok_or_else(|| anyhow!("Goal '{}' not found", id))?;
            println!(
                "'{}': {} of {} ({}%)",
                goal.name,
                goal.current_amount,
                goal.target_amount,
                goal.progress_pct()
            );
        }
        Some(("list", sub)) => {
            if !maybe_print_json(sub.get_flag("json"), &book.list())? {
                let rows = book
                    .list()
                    .iter()
                    .map(|g| {
                        vec![
                            g.id.clone(),
                            g.name.clone(),
                            g.current_amount.to_string(),
                            g.target_amount.to_string(),
                            format!("{}%", g.progress_pct()),
                            g.deadline.map(|d| d.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Saved", "Target", "Progress", "Deadline"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            if !book.delete(id) {
                bail!("Goal '{}' not found", id);
            }
            println!("Removed goal '{}'", id);
        }
        _ => {}
    }
    Ok(())
}
