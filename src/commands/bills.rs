// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::entities::{BillBook, BillDraft};
use crate::migrate::MigrationContext;
use crate::models::{Frequency, RecurringPayment};
use crate::store::KvStore;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{anyhow, Result};

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut book = BillBook::load(store, &ctx);
    match m.subcommand() {
        Some(("add", sub)) => {
            let frequency: Frequency = required(sub, "frequency")?
                .parse()
                .map_err(anyhow::Error::msg)?;
            let bill = book.add(BillDraft {
                description: required(sub, "description")?.clone(),
                amount: parse_decimal(required(sub, "amount")?)?,
                currency: sub
                    .get_one::<String>("currency")
                    .cloned()
                    .unwrap_or_else(|| ctx.default_currency.clone()),
                category: required(sub, "category")?.clone(),
                next_due_date: parse_date(required(sub, "due")?)?,
                frequency,
            })?;
            println!(
                "Added bill '{}' due {} (id={})",
                bill.description, bill.next_due_date, bill.id
            );
        }
        Some(("list", sub)) => {
            let bills: Vec<&RecurringPayment> = match sub.get_one::<String>("until") {
                Some(until) => book.due(parse_date(until)?),
                None => book.list().iter().collect(),
            };
            if !maybe_print_json(sub.get_flag("json"), &bills)? {
                let rows = bills
                    .iter()
                    .map(|b| {
                        vec![
                            b.id.clone(),
                            b.description.clone(),
                            format!("{} {}", b.amount, b.currency),
                            b.next_due_date.to_string(),
                            b.frequency.to_string(),
                            if b.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Description", "Amount", "Next due", "Frequency", "Active"],
                        rows
                    )
                );
            }
        }
        Some(("paid", sub)) => {
            let id = required(sub, "id")?;
            let next = book
                .mark_paid(id)
                .ok_or_else(|| anyhow!("Bill '{}' not found", id))?;
            println!("Marked paid; next due {}", next);
        }
        Some(("toggle", sub)) => {
            let id = required(sub, "id")?;
            let active = book
                .toggle(id)
                .ok_or_else(|| anyhow!("Bill '{}' not found", id))?;
            println!("Bill '{}' is now {}", id, if active { "active" } else { "paused" });
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            if !book.delete(id) {
                return Err(anyhow!("Bill '{}' not found", id));
            }
            println!("Removed bill '{}'", id);
        }
        _ => {}
    }
    Ok(())
}
