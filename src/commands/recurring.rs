// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{required, resolve_account};
use crate::entities::AccountBook;
use crate::migrate::MigrationContext;
use crate::models::{Frequency, RecurringRule, TransactionTemplate, TransactionType};
use crate::repository::TransactionRepository;
use crate::store::KvStore;
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};
use anyhow::{bail, Result};
use rust_decimal::Decimal;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut repo = TransactionRepository::load(store, &ctx);
    match m.subcommand() {
        Some(("add", sub)) => {
            let amount = parse_decimal(required(sub, "amount")?)?;
            if amount <= Decimal::ZERO {
                bail!("Amount must be positive");
            }
            let r#type: TransactionType = required(sub, "type")?
                .parse()
                .map_err(anyhow::Error::msg)?;
            let frequency: Frequency = required(sub, "frequency")?
                .parse()
                .map_err(anyhow::Error::msg)?;
            let day = sub.get_one::<u32>("day").copied().unwrap_or(1);
            let accounts = AccountBook::load(store, &ctx);
            let account_id = resolve_account(&accounts, sub.get_one::<String>("account"))?;
            let currency = sub
                .get_one::<String>("currency")
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| ctx.default_currency.clone());
            let item = repo.add_recurring(
                RecurringRule {
                    frequency,
                    day_of_month: day,
                    is_active: true,
                },
                TransactionTemplate {
                    r#type,
                    amount,
                    category: required(sub, "category")?.trim().to_lowercase(),
                    account_id,
                    currency,
                    description: sub.get_one::<String>("description").cloned().unwrap_or_default(),
                    tags: Vec::new(),
                },
            );
            if frequency != Frequency::Monthly {
                println!("Note: only monthly rules generate transactions");
            }
            println!("Added recurring rule (id={}) on day {}", item.id, day);
        }
        Some(("list", sub)) => {
            if !maybe_print_json(sub.get_flag("json"), &repo.recurring())? {
                let rows = repo
                    .recurring()
                    .iter()
                    .map(|r| {
                        vec![
                            r.id.clone(),
                            r.template.r#type.as_str().to_string(),
                            format!("{} {}", r.template.amount, r.template.currency),
                            r.template.category.clone(),
                            r.rule.frequency.to_string(),
                            r.rule.day_of_month.to_string(),
                            if r.rule.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Type", "Amount", "Category", "Frequency", "Day", "Active"],
                        rows
                    )
                );
            }
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            if !repo.remove_recurring(id) {
                bail!("Recurring rule '{}' not found", id);
            }
            println!("Removed recurring rule '{}'", id);
        }
        _ => {}
    }
    Ok(())
}
