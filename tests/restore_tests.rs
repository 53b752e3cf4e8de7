// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::interchange::restore::{
    restore_archive, stage_archive, RestoreError, RestoreOptions,
};
use pocketledger::keys::StorageKey;
use pocketledger::migrate::{self, MigrationContext};
use pocketledger::models::{Account, Goal, Transaction};
use pocketledger::store::{KvStore, MemoryMedium};
use serde_json::json;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const ACCOUNTS: &str = "id,name,type,balance,currency\nmain,Main,bank,10.00,USD\n";
const TRANSACTIONS: &str = "id,type,amount,currency,categoryId,accountId,date,description,tags,isRecurring\n\
t1,expense,4.20,USD,food,main,2024-02-01,Coffee,,false\n\
t2,income,100,USD,salary,main,2024-02-02,,bonus;q1,false\n";

fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        for (name, body) in files {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

fn goals(store: &KvStore) -> Option<Vec<Goal>> {
    migrate::load(store, StorageKey::Goals, &MigrationContext::default())
}

#[test]
fn missing_file_leaves_collection_untouched() {
    let store = KvStore::in_memory();
    let existing = json!([{"id": "g1", "name": "Car", "targetAmount": "5000",
        "currentAmount": "100", "createdAt": "2024-01-01T00:00:00Z"}]);
    store.set("pocketledger_goals", &existing);

    let bytes = zip_of(&[("accounts.csv", ACCOUNTS), ("transactions.csv", TRANSACTIONS)]);
    let report = restore_archive(&bytes, &store, &RestoreOptions::default()).unwrap();
    assert_eq!(report.restored, vec!["accounts.csv", "transactions.csv"]);
    assert!(report.skipped.contains(&"goals.csv".to_string()));

    let kept = goals(&store).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, "Car");

    let txs: Vec<Transaction> =
        migrate::load(&store, StorageKey::Transactions, &MigrationContext::default()).unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[1].tags, vec!["bonus", "q1"]);
}

#[test]
fn missing_goals_on_empty_store_stays_empty() {
    let store = KvStore::in_memory();
    let bytes = zip_of(&[("accounts.csv", ACCOUNTS)]);
    restore_archive(&bytes, &store, &RestoreOptions::default()).unwrap();
    assert!(goals(&store).is_none());
}

#[test]
fn missing_required_header_commits_nothing() {
    let store = KvStore::in_memory();
    let broken = "id,type,currency,categoryId,accountId,date,description,tags,isRecurring\n\
                  t1,expense,USD,food,main,2024-02-01,Coffee,,false\n";
    let bytes = zip_of(&[("accounts.csv", ACCOUNTS), ("transactions.csv", broken)]);

    let err = restore_archive(&bytes, &store, &RestoreOptions::default()).unwrap_err();
    match err {
        RestoreError::HeaderMismatch { file, .. } => assert_eq!(file, "transactions.csv"),
        other => panic!("unexpected error: {other}"),
    }
    // accounts.csv was valid but must not have been written.
    assert!(store.keys().is_empty());
}

#[test]
fn invalid_value_names_the_cell() {
    let store = KvStore::in_memory();
    let bad = "id,type,amount,currency,categoryId,accountId,date,description,tags,isRecurring\n\
               t1,expense,-3,USD,food,main,2024-02-01,,,false\n";
    let err = restore_archive(&zip_of(&[("transactions.csv", bad)]), &store, &Default::default())
        .unwrap_err();
    match err {
        RestoreError::InvalidValue { file, row, column, value } => {
            assert_eq!(file, "transactions.csv");
            assert_eq!(row, 1);
            assert_eq!(column, "amount");
            assert_eq!(value, "-3");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.keys().is_empty());
}

#[test]
fn not_a_zip_is_rejected() {
    let store = KvStore::in_memory();
    let err = restore_archive(b"plain text", &store, &RestoreOptions::default()).unwrap_err();
    assert!(matches!(err, RestoreError::Archive(_)));
}

#[test]
fn commit_failure_is_atomic() {
    let store = KvStore::new(MemoryMedium::with_quota(64));
    let err = restore_archive(
        &zip_of(&[("accounts.csv", ACCOUNTS), ("transactions.csv", TRANSACTIONS)]),
        &store,
        &RestoreOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, RestoreError::Commit(_)));
    assert!(store.keys().is_empty());
}

#[test]
fn restore_drops_stale_legacy_names() {
    let store = KvStore::in_memory();
    store.set("spendwise_goals", &json!([{"id": "old", "name": "Old", "targetAmount": "10",
        "currentAmount": "0", "createdAt": "2023-01-01T00:00:00Z"}]));
    let empty_goals = "id,name,targetAmount,currentAmount,category,deadline,description,createdAt\n";
    restore_archive(&zip_of(&[("goals.csv", empty_goals)]), &store, &Default::default()).unwrap();
    assert!(!store.contains("spendwise_goals"));
    assert_eq!(goals(&store), Some(Vec::new()));
}

#[test]
fn empty_accounts_file_is_rejected() {
    let store = KvStore::in_memory();
    store.set("pocketledger_accounts", &json!([{"id": "cash", "name": "Cash", "type": "cash",
        "balance": "0", "currency": "USD"}]));
    let header_only = "id,name,type,balance,currency\n";
    let err = restore_archive(
        &zip_of(&[("accounts.csv", header_only), ("transactions.csv", TRANSACTIONS)]),
        &store,
        &RestoreOptions::default(),
    )
    .unwrap_err();
    match err {
        RestoreError::NoAccounts { file } => assert_eq!(file, "accounts.csv"),
        other => panic!("unexpected error: {other}"),
    }
    let accounts: Vec<Account> =
        migrate::load(&store, StorageKey::Accounts, &MigrationContext::default()).unwrap();
    assert_eq!(accounts.len(), 1);
    assert!(!store.contains("pocketledger_transactions"));
}

#[test]
fn transaction_cap_truncates_staged_rows() {
    let opts = RestoreOptions {
        max_transactions: Some(1),
    };
    let (staged, report) = stage_archive(&zip_of(&[("transactions.csv", TRANSACTIONS)]), &opts)
        .unwrap();
    assert_eq!(staged.transactions.unwrap().len(), 1);
    assert_eq!(report.truncated, 1);
    assert_eq!(report.transactions, 1);
    assert!(!report.reload_required);
}

#[test]
fn budgets_and_settings_rows_map_onto_their_fields() {
    let budgets = "id,categoryId,limit,period\nb1,overall,900,monthly\nb2,food,150.5,monthly\nb3,travel,,monthly\n";
    let settings = "key,value\ntheme,dark\ncurrency,JPY\nprivacyMode,true\n";
    let onboarding = "key,value\nonboardingComplete,yes\n";
    let (staged, _) = stage_archive(
        &zip_of(&[
            ("budgets.csv", budgets),
            ("settings.csv", settings),
            ("onboarding.csv", onboarding),
        ]),
        &RestoreOptions::default(),
    )
    .unwrap();
    let budget = staged.budget.unwrap();
    assert_eq!(budget.overall.unwrap().to_string(), "900");
    assert_eq!(budget.per_category.len(), 1);
    assert_eq!(staged.theme.as_deref(), Some("dark"));
    assert_eq!(staged.currency.as_deref(), Some("JPY"));
    assert_eq!(staged.privacy_mode, Some(true));
    assert_eq!(staged.onboarding_complete, Some(true));
}
