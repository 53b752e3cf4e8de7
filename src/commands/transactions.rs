// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{parse_tags, required, resolve_account};
use crate::entities::AccountBook;
use crate::migrate::MigrationContext;
use crate::models::{TransactionDraft, TransactionType};
use crate::repository::{TransactionFilter, TransactionRepository};
use crate::store::KvStore;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, parse_month, pretty_table};
use anyhow::{bail, Result};
use chrono::Local;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut repo = TransactionRepository::load(store, &ctx);
    match m.subcommand() {
        Some(("add", sub)) => add(store, &ctx, &mut repo, sub)?,
        Some(("list", sub)) => return list(store, &ctx, &repo, sub),
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            if !repo.delete(id) {
                bail!("Transaction '{}' not found", id);
            }
            println!("Removed transaction '{}'", id);
        }
        Some(("generate", sub)) => {
            let today = match sub.get_one::<String>("today") {
                Some(s) => parse_date(s)?,
                None => Local::now().date_naive(),
            };
            let created = repo.generate_recurring_instances(today);
            for t in &created {
                println!("Generated {} {} on {} ({})", t.r#type.as_str(), t.amount, t.date, t.category);
            }
            println!("{} recurring transaction(s) generated", created.len());
        }
        _ => return Ok(()),
    }
    // Gives any write that failed during this run one more attempt.
    repo.flush();
    Ok(())
}

fn add(
    store: &KvStore,
    ctx: &MigrationContext,
    repo: &mut TransactionRepository<'_>,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let date = parse_date(required(sub, "date")?)?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    if amount.is_zero() {
        bail!("Amount must not be zero");
    }
    let r#type: TransactionType = required(sub, "type")?
        .parse()
        .map_err(anyhow::Error::msg)?;
    let accounts = AccountBook::load(store, ctx);
    let account_id = resolve_account(&accounts, sub.get_one::<String>("account"))?;
    let currency = sub
        .get_one::<String>("currency")
        .map(|c| c.to_uppercase())
        .or_else(|| accounts.get(&account_id).map(|a| a.currency.clone()))
        .unwrap_or_else(|| ctx.default_currency.clone());

    let tx = repo.add(TransactionDraft {
        r#type,
        amount,
        category: required(sub, "category")?.trim().to_lowercase(),
        date,
        description: sub.get_one::<String>("description").cloned().unwrap_or_default(),
        account_id,
        currency,
        tags: parse_tags(sub.get_one::<String>("tags")),
        recurring_rule_id: None,
        is_recurring: false,
    });
    println!(
        "Recorded {} {} {} on {} (id={})",
        tx.r#type.as_str(),
        tx.amount,
        tx.currency,
        tx.date,
        tx.id
    );
    Ok(())
}

/// Turns `tx list` flags into a repository filter.
pub fn build_filter(
    store: &KvStore,
    ctx: &MigrationContext,
    sub: &clap::ArgMatches,
) -> Result<TransactionFilter> {
    let account_id = match sub.get_one::<String>("account") {
        Some(a) => Some(resolve_account(&AccountBook::load(store, ctx), Some(a))?),
        None => None,
    };
    Ok(TransactionFilter {
        month: sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?,
        account_id,
        category: sub.get_one::<String>("category").cloned(),
        limit: sub.get_one::<usize>("limit").copied(),
    })
}

fn list(
    store: &KvStore,
    ctx: &MigrationContext,
    repo: &TransactionRepository<'_>,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let filter = build_filter(store, ctx, sub)?;
    let rows = repo.list(&filter);
    if !maybe_print_json(sub.get_flag("json"), &rows)? {
        let data = rows
            .iter()
            .map(|t| {
                vec![
                    t.date.to_string(),
                    t.r#type.as_str().to_string(),
                    format!("{} {}", t.amount, t.currency),
                    t.category.clone(),
                    t.account_id.clone(),
                    t.description.clone(),
                    t.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Type", "Amount", "Category", "Account", "Description", "Id"],
                data
            )
        );
    }
    Ok(())
}
