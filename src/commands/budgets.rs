// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::entities::{BudgetBook, BudgetLine};
use crate::migrate::MigrationContext;
use crate::repository::TransactionRepository;
use crate::store::KvStore;
use crate::utils::{maybe_print_json, parse_decimal, parse_month, pretty_table};
use anyhow::{bail, Result};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut book = BudgetBook::load(store, &ctx);
    match m.subcommand() {
        Some(("set", sub)) => {
            let limit = sub
                .get_one::<String>("amount")
                .map(|s| parse_decimal(s))
                .transpose()?;
            if limit.is_some_and(|l| l <= Decimal::ZERO) {
                bail!("Budget limit must be positive");
            }
            let scope = match sub.get_one::<String>("category") {
                Some(cat) => {
                    let cat = cat.trim().to_lowercase();
                    book.set_category(&cat, limit).into_result()?;
                    format!("category '{}'", cat)
                }
                None => {
                    book.set_overall(limit).into_result()?;
                    "overall".to_string()
                }
            };
            match limit {
                Some(l) => println!("Set {} budget to {}", scope, l),
                None => println!("Cleared {} budget", scope),
            }
        }
        Some(("status", sub)) => {
            let month = match sub.get_one::<String>("month") {
                Some(s) => parse_month(s)?,
                None => {
                    let today = Local::now().date_naive();
                    NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
                }
            };
            let repo = TransactionRepository::load(store, &ctx);
            let status = book.status(month, repo.transactions());
            if !maybe_print_json(sub.get_flag("json"), &status)? {
                let line = |name: String, l: &BudgetLine| {
                    vec![
                        name,
                        l.limit.to_string(),
                        l.spent.to_string(),
                        l.remaining.to_string(),
                        if l.over_limit { "OVER" } else { "ok" }.to_string(),
                    ]
                };
                let mut rows = Vec::new();
                if let Some(o) = &status.overall {
                    rows.push(line("(overall)".to_string(), o));
                }
                for l in &status.categories {
                    rows.push(line(l.category.clone().unwrap_or_default(), l));
                }
                println!("Budget status for {}", status.month);
                println!(
                    "{}",
                    pretty_table(&["Scope", "Limit", "Spent", "Remaining", "Status"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
