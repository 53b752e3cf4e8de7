// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::entities::{
    AccountBook, BillBook, BillDraft, BudgetBook, CategoryBook, GoalBook, GoalDraft, SettingsBook,
};
use pocketledger::interchange::archive::{
    export_archive, export_transactions_csv, DataSnapshot, ExportMeta,
};
use pocketledger::interchange::restore::{restore_archive, RestoreOptions};
use pocketledger::interchange::{manifest, EntityFile};
use pocketledger::migrate::MigrationContext;
use pocketledger::models::{
    AccountType, Frequency, RecurringRule, TransactionDraft, TransactionTemplate, TransactionType,
};
use pocketledger::repository::TransactionRepository;
use pocketledger::store::KvStore;
use rust_decimal::Decimal;
use std::io::{Cursor, Read};
use std::str::FromStr;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn tx(date: &str, amount: &str, category: &str, tags: &[&str]) -> TransactionDraft {
    TransactionDraft {
        r#type: TransactionType::Expense,
        amount: dec(amount),
        category: category.into(),
        date: d(date),
        description: "with, a comma".into(),
        account_id: "bank".into(),
        currency: "EUR".into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        recurring_rule_id: None,
        is_recurring: false,
    }
}

/// A store holding at least one record of every collection.
fn populated_store() -> KvStore {
    let store = KvStore::in_memory();
    let ctx = MigrationContext::default();

    let mut settings = SettingsBook::load(&store, &ctx);
    settings.set_theme("dark");
    settings.set_currency("EUR");
    settings.set_privacy_mode(true);
    settings.set_onboarding_complete(true);

    let mut accounts = AccountBook::load(&store, &ctx);
    accounts
        .add("Brokerage", AccountType::Investment, "EUR", dec("1500.25"))
        .unwrap();
    CategoryBook::load(&store, &ctx)
        .add("Pets", "🐶", "#123456")
        .unwrap();

    let mut repo = TransactionRepository::load(&store, &ctx);
    repo.add(tx("2024-05-02", "12.50", "food", &["lunch", "work"]));
    repo.add(tx("2024-05-03", "3", "pets", &[]));
    repo.add_recurring(
        RecurringRule {
            frequency: Frequency::Monthly,
            day_of_month: 1,
            is_active: true,
        },
        TransactionTemplate {
            r#type: TransactionType::Income,
            amount: dec("2500"),
            category: "salary".into(),
            account_id: "bank".into(),
            currency: "EUR".into(),
            description: "Payroll".into(),
            tags: vec!["job".into()],
        },
    );
    repo.generate_recurring_instances(d("2024-05-20"));

    let mut budgets = BudgetBook::load(&store, &ctx);
    budgets.set_overall(Some(dec("2000")));
    budgets.set_category("food", Some(dec("300")));

    GoalBook::load(&store, &ctx)
        .add(GoalDraft {
            name: "Holiday".into(),
            target_amount: dec("1000"),
            current_amount: dec("125.50"),
            deadline: Some(d("2025-06-01")),
            category: "travel".into(),
            description: "Lisbon".into(),
        })
        .unwrap();
    BillBook::load(&store, &ctx)
        .add(BillDraft {
            description: "Internet".into(),
            amount: dec("39.99"),
            currency: "EUR".into(),
            category: "bills".into(),
            next_due_date: d("2024-06-05"),
            frequency: Frequency::Monthly,
        })
        .unwrap();
    store
}

fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut body = String::new();
    zip.by_name(name).unwrap().read_to_string(&mut body).unwrap();
    body
}

#[test]
fn archive_contains_every_file_with_headers() {
    let store = populated_store();
    let snap = DataSnapshot::load(&store, &MigrationContext::from_store(&store));
    let bytes = export_archive(&snap, &ExportMeta::default()).unwrap();

    let zip = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    assert_eq!(zip.len(), manifest().len());
    for file in manifest() {
        let body = read_entry(&bytes, file.file_name());
        let header = body.lines().next().unwrap();
        assert_eq!(header, file.headers().join(","), "{}", file.file_name());
    }

    let meta = read_entry(&bytes, EntityFile::Metadata.file_name());
    assert!(meta.contains("appName,PocketLedger"));
    let budgets = read_entry(&bytes, EntityFile::Budgets.file_name());
    assert!(budgets.contains("overall,2000"));
}

#[test]
fn archive_round_trips_into_an_empty_store() {
    let source = populated_store();
    let original = DataSnapshot::load(&source, &MigrationContext::from_store(&source));
    assert_eq!(original.transactions.len(), 3);
    let bytes = export_archive(&original, &ExportMeta::default()).unwrap();

    let target = KvStore::in_memory();
    let report = restore_archive(&bytes, &target, &RestoreOptions::default()).unwrap();
    assert!(report.reload_required);
    assert!(report.skipped.is_empty());
    assert_eq!(report.transactions, 3);

    let restored = DataSnapshot::load(&target, &MigrationContext::from_store(&target));
    assert_eq!(restored, original);
}

#[test]
fn transactions_csv_is_spreadsheet_friendly() {
    let transactions = vec![pocketledger::models::Transaction::from_draft(
        "t1".into(),
        TransactionDraft {
            currency: "USD".into(),
            description: "Lunch".into(),
            ..tx("2024-03-05", "12.50", "food", &[])
        },
    )];
    let csv = export_transactions_csv(&transactions, "USD").unwrap();
    assert!(csv.starts_with('\u{feff}'));
    let mut lines = csv.trim_start_matches('\u{feff}').lines();
    assert_eq!(lines.next(), Some("Date,Type,Category,Amount ($),Note"));
    assert_eq!(lines.next(), Some("05 Mar 2024,Expense,Food,12.50,Lunch"));
}
