// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::migrate::MigrationContext;
use pocketledger::models::{
    Frequency, RecurringRule, Transaction, TransactionDraft, TransactionTemplate, TransactionType,
};
use pocketledger::repository::{TransactionFilter, TransactionRepository};
use pocketledger::store::KvStore;
use rust_decimal::Decimal;
use std::str::FromStr;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn draft(date: &str, amount: &str, category: &str, account: &str) -> TransactionDraft {
    TransactionDraft {
        r#type: TransactionType::Expense,
        amount: dec(amount),
        category: category.into(),
        date: d(date),
        description: String::new(),
        account_id: account.into(),
        currency: "USD".into(),
        tags: Vec::new(),
        recurring_rule_id: None,
        is_recurring: false,
    }
}

fn rent_rule(day: u32) -> (RecurringRule, TransactionTemplate) {
    (
        RecurringRule {
            frequency: Frequency::Monthly,
            day_of_month: day,
            is_active: true,
        },
        TransactionTemplate {
            r#type: TransactionType::Expense,
            amount: dec("1200"),
            category: "bills".into(),
            account_id: "bank".into(),
            currency: "USD".into(),
            description: "Rent".into(),
            tags: Vec::new(),
        },
    )
}

#[test]
fn add_persists_and_survives_reload() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let id = {
        let mut repo = TransactionRepository::load(&store, &ctx);
        repo.add(draft("2024-05-02", "-9.99", "food", "cash")).id
    };
    let repo = TransactionRepository::load(&store, &ctx);
    let tx = repo.get(&id).unwrap();
    // Amounts are stored as magnitudes.
    assert_eq!(tx.amount, dec("9.99"));
    assert_eq!(tx.signed_amount(), dec("-9.99"));
}

#[test]
fn list_filters_and_orders_newest_first() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(&store, &ctx);
    repo.add(draft("2024-05-10", "5", "food", "cash"));
    repo.add(draft("2024-05-20", "6", "transport", "cash"));
    repo.add(draft("2024-04-30", "7", "food", "bank"));
    repo.add(draft("2024-05-01", "8", "food", "bank"));

    let may = repo.list(&TransactionFilter {
        month: Some(d("2024-05-15")),
        ..Default::default()
    });
    let dates: Vec<String> = may.iter().map(|t| t.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-05-20", "2024-05-10", "2024-05-01"]);

    let bank_food = repo.list(&TransactionFilter {
        account_id: Some("bank".into()),
        category: Some("FOOD".into()),
        limit: Some(1),
        ..Default::default()
    });
    assert_eq!(bank_food.len(), 1);
    assert_eq!(bank_food[0].date, d("2024-05-01"));
}

#[test]
fn update_and_delete_unknown_ids_are_noops() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(&store, &ctx);
    let tx = repo.add(draft("2024-05-10", "5", "food", "cash"));
    assert!(!repo.delete("missing"));
    assert!(!repo.update("missing", draft("2024-05-11", "1", "food", "cash")));
    assert!(repo.update(&tx.id, draft("2024-05-11", "15", "health", "cash")));
    assert_eq!(repo.get(&tx.id).unwrap().category, "health");
    assert!(repo.delete(&tx.id));
    assert!(repo.transactions().is_empty());
}

#[test]
fn generation_is_idempotent_within_a_month() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(&store, &ctx);
    let (rule, template) = rent_rule(1);
    let item = repo.add_recurring(rule, template);

    let first = repo.generate_recurring_instances(d("2024-06-15"));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].date, d("2024-06-01"));
    assert_eq!(first[0].recurring_rule_id.as_deref(), Some(item.id.as_str()));
    assert!(first[0].is_recurring);

    assert!(repo.generate_recurring_instances(d("2024-06-20")).is_empty());
    assert_eq!(repo.transactions().len(), 1);

    // Still one after a reload from storage.
    let mut reloaded = TransactionRepository::load(&store, &ctx);
    assert!(reloaded.generate_recurring_instances(d("2024-06-30")).is_empty());
    assert_eq!(reloaded.generate_recurring_instances(d("2024-07-01")).len(), 1);
}

#[test]
fn generation_waits_for_the_day_and_clamps_short_months() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(&store, &ctx);
    let (rule, template) = rent_rule(31);
    repo.add_recurring(rule, template);

    assert!(repo.generate_recurring_instances(d("2024-02-28")).is_empty());
    let created = repo.generate_recurring_instances(d("2024-02-29"));
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].date, d("2024-02-29"));
}

#[test]
fn inactive_and_non_monthly_rules_generate_nothing() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(&store, &ctx);
    let (mut rule, template) = rent_rule(1);
    rule.is_active = false;
    repo.add_recurring(rule.clone(), template.clone());
    rule.is_active = true;
    rule.frequency = Frequency::Weekly;
    repo.add_recurring(rule, template);
    assert!(repo.generate_recurring_instances(d("2024-06-15")).is_empty());
}

#[test]
fn removing_a_rule_keeps_generated_transactions() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(&store, &ctx);
    let (rule, template) = rent_rule(1);
    let item = repo.add_recurring(rule, template);
    repo.generate_recurring_instances(d("2024-06-02"));
    assert!(repo.remove_recurring(&item.id));
    assert!(repo.recurring().is_empty());
    let kept: &Transaction = &repo.transactions()[0];
    assert_eq!(kept.recurring_rule_id.as_deref(), Some(item.id.as_str()));
}
