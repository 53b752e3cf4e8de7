// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::migrate::MigrationContext;
use pocketledger::models::{TransactionDraft, TransactionType};
use pocketledger::repository::TransactionRepository;
use pocketledger::store::KvStore;
use pocketledger::{cli, commands::transactions};
use rust_decimal::Decimal;

fn setup(store: &KvStore) {
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(store, &ctx);
    for (i, account) in [(1, "cash"), (2, "bank"), (3, "cash")] {
        repo.add(TransactionDraft {
            r#type: TransactionType::Expense,
            amount: Decimal::TEN,
            category: "food".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, i).unwrap(),
            description: "P".into(),
            account_id: account.into(),
            currency: "USD".into(),
            tags: Vec::new(),
            recurring_rule_id: None,
            is_recurring: false,
        });
    }
}

#[test]
fn list_limit_respected() {
    let store = KvStore::in_memory();
    setup(&store);
    let ctx = MigrationContext::default();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["pocketledger", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let filter = transactions::build_filter(&store, &ctx, list_m).unwrap();
            let repo = TransactionRepository::load(&store, &ctx);
            let rows = repo.list(&filter);
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date.to_string(), "2025-01-03");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_filters_by_account_name_and_month() {
    let store = KvStore::in_memory();
    setup(&store);
    let ctx = MigrationContext::default();
    let matches = cli::build_cli().get_matches_from([
        "pocketledger", "tx", "list", "--account", "Cash", "--month", "2025-01",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    let filter = transactions::build_filter(&store, &ctx, list_m).unwrap();
    assert_eq!(filter.account_id.as_deref(), Some("cash"));
    let repo = TransactionRepository::load(&store, &ctx);
    assert_eq!(repo.list(&filter).len(), 2);
}
