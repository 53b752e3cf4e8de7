// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::entities::{
    advance, AccountBook, BillBook, BillDraft, BudgetBook, CategoryBook, EntityError, GoalBook,
    GoalDraft, SettingsBook,
};
use pocketledger::migrate::MigrationContext;
use pocketledger::models::{AccountType, Frequency, TransactionDraft, TransactionType};
use pocketledger::repository::TransactionRepository;
use pocketledger::store::KvStore;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn accounts_seed_once_and_keep_the_last_one() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut book = AccountBook::load(&store, &ctx);
    let ids: Vec<&str> = book.list().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["cash", "bank", "credit"]);

    assert!(book.delete("bank"));
    assert!(book.delete("credit"));
    assert!(!book.delete("cash"));
    assert_eq!(book.list().len(), 1);

    // A reload sees the pruned list, not a fresh seed.
    let book = AccountBook::load(&store, &ctx);
    assert_eq!(book.list().len(), 1);
}

#[test]
fn account_names_are_unique() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut book = AccountBook::load(&store, &ctx);
    let added = book
        .add("Savings", AccountType::Savings, "eur", dec("10"))
        .unwrap();
    assert_eq!(added.currency, "EUR");
    assert_eq!(book.find("savings").map(|a| a.id.clone()), Some(added.id));
    assert_eq!(
        book.add("CASH", AccountType::Cash, "USD", Decimal::ZERO),
        Err(EntityError::Duplicate("CASH".into()))
    );
    assert_eq!(
        book.add("  ", AccountType::Cash, "USD", Decimal::ZERO),
        Err(EntityError::EmptyName)
    );
}

#[test]
fn categories_merge_custom_over_defaults() {
    let store = KvStore::in_memory();
    store.set(
        "customCategories",
        &json!([{"id": "pets", "name": "Pets", "icon": "🐶", "color": "#000"},
                {"id": "food", "name": "Shadowed"}]),
    );
    let ctx = MigrationContext::default();
    let mut book = CategoryBook::load(&store, &ctx);
    assert_eq!(book.list().len(), 13);
    assert_eq!(
        book.list().iter().find(|c| c.id == "food").unwrap().name,
        "Food & Dining"
    );
    assert!(!book.delete("food"));
    assert!(book.delete("pets"));

    let added = book.add("Side Hustle", "💼", "#fff").unwrap();
    assert_eq!(added.id, "side-hustle");
    let stored: Vec<serde_json::Value> = store.get("pocketledger_categories", Vec::new());
    assert_eq!(stored.len(), 1);
}

#[test]
fn budget_status_counts_month_expenses() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut repo = TransactionRepository::load(&store, &ctx);
    for (date, amount, cat, kind) in [
        ("2024-05-03", "40", "food", TransactionType::Expense),
        ("2024-05-09", "70", "food", TransactionType::Expense),
        ("2024-05-10", "30", "transport", TransactionType::Expense),
        ("2024-05-11", "999", "salary", TransactionType::Income),
        ("2024-04-30", "500", "food", TransactionType::Expense),
    ] {
        repo.add(TransactionDraft {
            r#type: kind,
            amount: dec(amount),
            category: cat.into(),
            date: d(date),
            description: String::new(),
            account_id: "cash".into(),
            currency: "USD".into(),
            tags: Vec::new(),
            recurring_rule_id: None,
            is_recurring: false,
        });
    }

    let mut budgets = BudgetBook::load(&store, &ctx);
    assert!(budgets.set_overall(Some(dec("500"))).is_persisted());
    budgets.set_category("food", Some(dec("100")));
    budgets.set_category("travel", Some(dec("50")));
    budgets.set_category("travel", None);

    let status = budgets.status(d("2024-05-01"), repo.transactions());
    assert_eq!(status.month, "2024-05");
    let overall = status.overall.unwrap();
    assert_eq!(overall.spent, dec("140"));
    assert!(!overall.over_limit);
    assert_eq!(status.categories.len(), 1);
    let food = &status.categories[0];
    assert_eq!(food.spent, dec("110"));
    assert_eq!(food.remaining, dec("-10"));
    assert!(food.over_limit);
}

#[test]
fn goal_progress_is_clamped() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut goals = GoalBook::load(&store, &ctx);
    let goal = goals
        .add(GoalDraft {
            name: "Bike".into(),
            target_amount: dec("200"),
            current_amount: dec("250"),
            deadline: Some(d("2025-01-01")),
            category: "other".into(),
            description: String::new(),
        })
        .unwrap();
    assert_eq!(goal.current_amount, dec("200"));

    let after = goals.contribute(&goal.id, dec("-300")).unwrap();
    assert_eq!(after.current_amount, Decimal::ZERO);
    let after = goals.set_current(&goal.id, dec("50")).unwrap();
    assert_eq!(after.progress_pct(), dec("25.0"));
    assert!(goals.contribute("missing", Decimal::ONE).is_none());

    let zero_target = goals.add(GoalDraft {
        name: "Nothing".into(),
        target_amount: Decimal::ZERO,
        current_amount: Decimal::ZERO,
        deadline: None,
        category: "other".into(),
        description: String::new(),
    });
    assert_eq!(zero_target, Err(EntityError::NonPositiveAmount(Decimal::ZERO)));
}

#[test]
fn bills_advance_and_toggle() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut bills = BillBook::load(&store, &ctx);
    let bill = bills
        .add(BillDraft {
            description: "Phone".into(),
            amount: dec("30"),
            currency: "usd".into(),
            category: "bills".into(),
            next_due_date: d("2024-01-31"),
            frequency: Frequency::Monthly,
        })
        .unwrap();
    assert_eq!(bill.currency, "USD");
    assert_eq!(bills.mark_paid(&bill.id), Some(d("2024-02-29")));
    assert_eq!(bills.due(d("2024-03-01")).len(), 1);
    assert_eq!(bills.toggle(&bill.id), Some(false));
    assert!(bills.due(d("2024-03-01")).is_empty());

    assert_eq!(advance(d("2024-02-29"), Frequency::Yearly), d("2025-02-28"));
    assert_eq!(advance(d("2024-01-01"), Frequency::Weekly), d("2024-01-08"));
}

#[test]
fn settings_default_and_persist() {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();
    let mut book = SettingsBook::load(&store, &ctx);
    assert_eq!(book.settings().theme, "system");
    assert_eq!(book.settings().currency, "USD");
    book.set_currency(" gbp ");
    book.set_privacy_mode(true);

    let book = SettingsBook::load(&store, &ctx);
    assert_eq!(book.settings().currency, "GBP");
    assert!(book.settings().privacy_mode);
    assert_eq!(MigrationContext::from_store(&store).default_currency, "GBP");
}
