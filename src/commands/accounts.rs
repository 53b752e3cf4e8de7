// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::entities::AccountBook;
use crate::migrate::MigrationContext;
use crate::models::AccountType;
use crate::store::KvStore;
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};
use anyhow::{bail, Result};

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut book = AccountBook::load(store, &ctx);
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required(sub, "name")?;
            let typ: AccountType = required(sub, "type")?.parse().map_err(anyhow::Error::msg)?;
            let ccy = sub
                .get_one::<String>("currency")
                .cloned()
                .unwrap_or_else(|| ctx.default_currency.clone());
            let balance = parse_decimal(required(sub, "balance")?)?;
            let account = book.add(name, typ, &ccy, balance)?;
            println!(
                "Added account '{}' ({}, {}) id={}",
                account.name,
                account.r#type.as_str(),
                account.currency,
                account.id
            );
        }
        Some(("list", sub)) => {
            if !maybe_print_json(sub.get_flag("json"), &book.list())? {
                let rows = book
                    .list()
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.clone(),
                            a.name.clone(),
                            a.r#type.as_str().to_string(),
                            a.currency.clone(),
                            a.balance.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Type", "Currency", "Balance"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            if !book.delete(id) {
                bail!("Cannot remove account '{}' (unknown, or the only account left)", id);
            }
            println!("Removed account '{}'", id);
        }
        _ => {}
    }
    Ok(())
}
