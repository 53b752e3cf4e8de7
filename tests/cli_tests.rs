// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::cli;
use pocketledger::commands::{
    self, accounts, backup, budgets, exporter, goals, importer, recurring, restore, transactions,
};
use pocketledger::db;
use pocketledger::migrate::MigrationContext;
use pocketledger::repository::TransactionRepository;
use pocketledger::store::KvStore;
use std::fs;

/// Runs `args` against `store` through the same dispatch the binary uses.
fn run(store: &KvStore, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["pocketledger"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().try_get_matches_from(argv)?;
    match matches.subcommand() {
        Some(("init", _)) => commands::init(store),
        Some(("account", sub)) => accounts::handle(store, sub),
        Some(("tx", sub)) => transactions::handle(store, sub),
        Some(("recurring", sub)) => recurring::handle(store, sub),
        Some(("budget", sub)) => budgets::handle(store, sub),
        Some(("goal", sub)) => goals::handle(store, sub),
        Some(("import", sub)) => importer::handle(store, sub),
        Some(("export", sub)) => exporter::handle(store, sub),
        Some(("restore", sub)) => restore::handle(store, sub),
        Some(("backup", sub)) => backup::handle(store, sub),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

fn transactions_in(store: &KvStore) -> usize {
    TransactionRepository::load(store, &MigrationContext::from_store(store))
        .transactions()
        .len()
}

#[test]
fn tx_add_resolves_account_by_name() {
    let store = KvStore::in_memory();
    run(&store, &["init"]).unwrap();
    run(
        &store,
        &[
            "tx", "add", "--date", "2024-04-01", "--amount", "-25", "--category", "Food",
            "--account", "Bank", "--tags", "a; b",
        ],
    )
    .unwrap();
    let repo = TransactionRepository::load(&store, &MigrationContext::default());
    let tx = &repo.transactions()[0];
    assert_eq!(tx.account_id, "bank");
    assert_eq!(tx.category, "food");
    assert_eq!(tx.amount.to_string(), "25");
    assert_eq!(tx.tags, vec!["a", "b"]);

    assert!(run(&store, &["tx", "add", "--date", "2024-04-01", "--amount", "0", "--category", "food"]).is_err());
    assert!(run(&store, &["tx", "add", "--date", "2024-04-01", "--amount", "5", "--category", "food", "--account", "Nope"]).is_err());
}

#[test]
fn tx_list_writes_nothing() {
    let store = KvStore::in_memory();
    run(&store, &["tx", "list", "--month", "2024-04"]).unwrap();
    assert!(!store.contains("pocketledger_transactions"));
    assert!(!store.contains("pocketledger_recurring"));
    assert!(store.keys().is_empty());
}

#[test]
fn recurring_rule_generates_once() {
    let store = KvStore::in_memory();
    run(&store, &["recurring", "add", "--amount", "900", "--category", "bills", "--day", "3"]).unwrap();
    run(&store, &["tx", "generate", "--today", "2024-09-10"]).unwrap();
    run(&store, &["tx", "generate", "--today", "2024-09-11"]).unwrap();
    assert_eq!(transactions_in(&store), 1);
    assert!(run(&store, &["recurring", "add", "--amount", "1", "--category", "x", "--day", "32"]).is_err());
}

#[test]
fn import_commits_preview_unless_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bank.csv");
    fs::write(
        &path,
        "Posted Date,Desc,Amount,Category\n03/01/2024,Coffee,4.50,Food\n03/02/2024,Refund,N/A,Shopping\n",
    )
    .unwrap();
    let path = path.to_str().unwrap();

    let store = KvStore::in_memory();
    run(&store, &["import", "transactions", "--path", path, "--dry-run"]).unwrap();
    assert_eq!(transactions_in(&store), 0);
    run(&store, &["import", "transactions", "--path", path]).unwrap();
    assert_eq!(transactions_in(&store), 1);

    let empty = dir.path().join("empty.csv");
    fs::write(&empty, "Date,Amount\n").unwrap();
    assert!(run(&store, &["import", "transactions", "--path", empty.to_str().unwrap()]).is_err());
}

#[test]
fn archive_export_then_restore_via_cli() {
    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("export.zip");
    let zip = zip.to_str().unwrap();

    let source = KvStore::in_memory();
    run(&source, &["tx", "add", "--date", "2024-01-02", "--amount", "3", "--category", "food"]).unwrap();
    run(&source, &["goal", "add", "--name", "Fund", "--target", "100", "--current", "10"]).unwrap();
    run(&source, &["budget", "set", "--amount", "500"]).unwrap();
    run(&source, &["export", "archive", "--out", zip]).unwrap();

    let target = KvStore::in_memory();
    run(&target, &["restore", "archive", "--path", zip, "--dry-run"]).unwrap();
    assert_eq!(transactions_in(&target), 0);
    run(&target, &["restore", "archive", "--path", zip]).unwrap();
    assert_eq!(transactions_in(&target), 1);
}

#[test]
fn backup_file_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("backup.json");
    let json = json.to_str().unwrap();

    let source = db::open_store(Some(&dir.path().join("a.sqlite"))).unwrap();
    run(&source, &["tx", "add", "--date", "2024-01-02", "--amount", "3", "--category", "food"]).unwrap();
    run(&source, &["backup", "create", "--out", json]).unwrap();

    let target = db::open_store(Some(&dir.path().join("b.sqlite"))).unwrap();
    run(&target, &["backup", "restore", "--path", json]).unwrap();
    assert_eq!(transactions_in(&target), 1);
}

#[test]
fn cannot_remove_last_account() {
    let store = KvStore::in_memory();
    run(&store, &["account", "rm", "bank"]).unwrap();
    run(&store, &["account", "rm", "credit"]).unwrap();
    assert!(run(&store, &["account", "rm", "cash"]).is_err());
}
