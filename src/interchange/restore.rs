// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Archive restore: validate every file, stage every collection, then write
//! them all in one atomic commit.

use super::archive::TAG_SEPARATOR;
use super::EntityFile;
use crate::entities::OVERALL_BUDGET_ID;
use crate::keys::StorageKey;
use crate::models::{
    Account, Budget, Category, Goal, RecurringPayment, RecurringRule, RecurringTransaction,
    Transaction, TransactionTemplate,
};
use crate::store::{put_op, BatchOp, KvStore, StoreError};
use crate::utils::{new_id, parse_bool};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{Cursor, Read};
use std::str::FromStr;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("not a readable archive: {0}")]
    Archive(#[from] ZipError),
    #[error("could not read {file}: {message}")]
    Read { file: String, message: String },
    #[error("{file} does not have the expected columns (expected {expected:?}, found {found:?})")]
    HeaderMismatch {
        file: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("{file} row {row}: invalid {column} '{value}'")]
    InvalidValue {
        file: String,
        row: usize,
        column: String,
        value: String,
    },
    #[error("{file} has no rows; at least one account is required")]
    NoAccounts { file: String },
    #[error("could not write restored data: {0}")]
    Commit(#[from] StoreError),
}

/// Files read on restore, in order.
const RESTORE_ORDER: [EntityFile; 9] = [
    EntityFile::Categories,
    EntityFile::Accounts,
    EntityFile::Goals,
    EntityFile::Transactions,
    EntityFile::Budgets,
    EntityFile::RecurringPayments,
    EntityFile::RecurringRules,
    EntityFile::Settings,
    EntityFile::Onboarding,
];

#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Free-tier ceiling on restored transactions.
    pub max_transactions: Option<usize>,
}

/// Parsed collections waiting for commit. `None` means the file was absent
/// and the stored collection is left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedRestore {
    pub categories: Option<Vec<Category>>,
    pub accounts: Option<Vec<Account>>,
    pub goals: Option<Vec<Goal>>,
    pub transactions: Option<Vec<Transaction>>,
    pub budget: Option<Budget>,
    pub recurring_payments: Option<Vec<RecurringPayment>>,
    pub recurring_rules: Option<Vec<RecurringTransaction>>,
    pub theme: Option<String>,
    pub currency: Option<String>,
    pub privacy_mode: Option<bool>,
    pub onboarding_complete: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    pub restored: Vec<String>,
    pub skipped: Vec<String>,
    pub transactions: usize,
    /// Transactions dropped by the row cap.
    pub truncated: usize,
    /// Live state must be rebuilt from the store.
    pub reload_required: bool,
}

/// A parsed CSV file with header lookup.
struct Sheet {
    file: &'static str,
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl Sheet {
    fn parse(file: EntityFile, body: &str) -> Result<Self, RestoreError> {
        let body = body.strip_prefix('\u{feff}').unwrap_or(body);
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(body.as_bytes());
        let read_err = |e: csv::Error| RestoreError::Read {
            file: file.file_name().to_string(),
            message: e.to_string(),
        };
        let headers: Vec<String> = rdr
            .headers()
            .map_err(read_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let missing = file
            .required_headers()
            .iter()
            .any(|req| !headers.iter().any(|h| h == req));
        if missing {
            return Err(RestoreError::HeaderMismatch {
                file: file.file_name().to_string(),
                expected: file
                    .required_headers()
                    .iter()
                    .map(|h| h.to_string())
                    .collect(),
                found: headers,
            });
        }
        let mut records = Vec::new();
        for rec in rdr.records() {
            let rec = rec.map_err(read_err)?;
            if rec.iter().any(|c| !c.is_empty()) {
                records.push(rec);
            }
        }
        Ok(Self {
            file: file.file_name(),
            headers,
            records,
        })
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records
            .iter()
            .enumerate()
            .map(move |(i, rec)| Row {
                sheet: self,
                rec,
                line: i + 1,
            })
    }
}

struct Row<'a> {
    sheet: &'a Sheet,
    rec: &'a StringRecord,
    line: usize,
}

impl Row<'_> {
    fn get(&self, column: &str) -> &str {
        self.sheet
            .headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.rec.get(i))
            .unwrap_or("")
    }

    fn invalid(&self, column: &str) -> RestoreError {
        RestoreError::InvalidValue {
            file: self.sheet.file.to_string(),
            row: self.line,
            column: column.to_string(),
            value: self.get(column).to_string(),
        }
    }

    fn parse<T: FromStr>(&self, column: &str) -> Result<T, RestoreError> {
        self.get(column).parse::<T>().map_err(|_| self.invalid(column))
    }

    fn decimal(&self, column: &str) -> Result<Decimal, RestoreError> {
        self.parse::<Decimal>(column)
    }

    fn flag(&self, column: &str) -> Result<bool, RestoreError> {
        parse_bool(self.get(column)).ok_or_else(|| self.invalid(column))
    }

    fn date(&self, column: &str) -> Result<NaiveDate, RestoreError> {
        NaiveDate::parse_from_str(self.get(column), "%Y-%m-%d").map_err(|_| self.invalid(column))
    }

    fn opt_date(&self, column: &str) -> Result<Option<NaiveDate>, RestoreError> {
        if self.get(column).is_empty() {
            Ok(None)
        } else {
            self.date(column).map(Some)
        }
    }

    fn id(&self) -> String {
        match self.get("id") {
            "" => new_id(),
            id => id.to_string(),
        }
    }

    fn string(&self, column: &str) -> String {
        self.get(column).to_string()
    }

    fn tags(&self) -> Vec<String> {
        self.get("tags")
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn instant(&self, column: &str) -> Result<DateTime<Utc>, RestoreError> {
        let raw = self.get(column);
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| self.invalid(column))
    }
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    file: EntityFile,
) -> Result<Option<String>, RestoreError> {
    let mut entry = match archive.by_name(file.file_name()) {
        Ok(e) => e,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut body = String::new();
    entry
        .read_to_string(&mut body)
        .map_err(|e| RestoreError::Read {
            file: file.file_name().to_string(),
            message: e.to_string(),
        })?;
    Ok(Some(body))
}

fn stage_file(
    staged: &mut StagedRestore,
    file: EntityFile,
    sheet: &Sheet,
) -> Result<(), RestoreError> {
    match file {
        EntityFile::Categories => {
            let mut out = Vec::new();
            for row in sheet.rows() {
                out.push(Category {
                    id: row.id(),
                    name: row.string("name"),
                    icon: row.string("icon"),
                    color: row.string("color"),
                    is_default: row.flag("isDefault")?,
                });
            }
            staged.categories = Some(out);
        }
        EntityFile::Accounts => {
            let mut out = Vec::new();
            for row in sheet.rows() {
                out.push(Account {
                    id: row.id(),
                    name: row.string("name"),
                    r#type: row.parse("type")?,
                    balance: row.decimal("balance")?,
                    currency: row.string("currency"),
                });
            }
            if out.is_empty() {
                return Err(RestoreError::NoAccounts {
                    file: sheet.file.to_string(),
                });
            }
            staged.accounts = Some(out);
        }
        EntityFile::Goals => {
            let mut out = Vec::new();
            for row in sheet.rows() {
                let mut goal = Goal {
                    id: row.id(),
                    name: row.string("name"),
                    target_amount: row.decimal("targetAmount")?,
                    current_amount: Decimal::ZERO,
                    deadline: row.opt_date("deadline")?,
                    category: row.string("category"),
                    description: row.string("description"),
                    created_at: row.instant("createdAt")?,
                };
                goal.set_current(row.decimal("currentAmount")?);
                out.push(goal);
            }
            staged.goals = Some(out);
        }
        EntityFile::Transactions => {
            let mut out = Vec::new();
            for row in sheet.rows() {
                let amount = row.decimal("amount")?;
                if amount <= Decimal::ZERO {
                    return Err(row.invalid("amount"));
                }
                let rule_id = row.get("recurringRuleId");
                out.push(Transaction {
                    id: row.id(),
                    r#type: row.parse("type")?,
                    amount,
                    category: row.string("categoryId"),
                    date: row.date("date")?,
                    description: row.string("description"),
                    account_id: row.string("accountId"),
                    currency: row.string("currency"),
                    tags: row.tags(),
                    recurring_rule_id: (!rule_id.is_empty()).then(|| rule_id.to_string()),
                    is_recurring: row.flag("isRecurring")?,
                });
            }
            staged.transactions = Some(out);
        }
        EntityFile::Budgets => {
            let mut budget = Budget::default();
            for row in sheet.rows() {
                if row.get("limit").is_empty() {
                    continue;
                }
                let limit = row.decimal("limit")?;
                match row.get("categoryId") {
                    OVERALL_BUDGET_ID => budget.overall = Some(limit),
                    cat => {
                        budget.per_category.insert(cat.to_string(), Some(limit));
                    }
                }
            }
            staged.budget = Some(budget);
        }
        EntityFile::RecurringPayments => {
            let mut out = Vec::new();
            for row in sheet.rows() {
                out.push(RecurringPayment {
                    id: row.id(),
                    description: row.string("description"),
                    amount: row.decimal("amount")?,
                    currency: row.string("currency"),
                    category: row.string("categoryId"),
                    next_due_date: row.date("nextDueDate")?,
                    frequency: row.parse("frequency")?,
                    is_active: row.flag("isActive")?,
                });
            }
            staged.recurring_payments = Some(out);
        }
        EntityFile::RecurringRules => {
            let mut out = Vec::new();
            for row in sheet.rows() {
                out.push(RecurringTransaction {
                    id: row.id(),
                    rule: RecurringRule {
                        frequency: row.parse("frequency")?,
                        day_of_month: row.parse("dayOfMonth")?,
                        is_active: row.flag("isActive")?,
                    },
                    template: TransactionTemplate {
                        r#type: row.parse("type")?,
                        amount: row.decimal("amount")?,
                        category: row.string("categoryId"),
                        account_id: row.string("accountId"),
                        currency: row.string("currency"),
                        description: row.string("description"),
                        tags: row.tags(),
                    },
                });
            }
            staged.recurring_rules = Some(out);
        }
        EntityFile::Settings => {
            for row in sheet.rows() {
                match row.get("key") {
                    "theme" => staged.theme = Some(row.string("value")),
                    "currency" => staged.currency = Some(row.string("value")),
                    "privacyMode" => staged.privacy_mode = Some(row.flag("value")?),
                    other => tracing::warn!(key = other, "ignoring unknown setting"),
                }
            }
        }
        EntityFile::Onboarding => {
            for row in sheet.rows() {
                if row.get("key") == "onboardingComplete" {
                    staged.onboarding_complete = Some(row.flag("value")?);
                }
            }
        }
        EntityFile::Metadata => {}
    }
    Ok(())
}

/// Validates and parses an archive without touching the store.
pub fn stage_archive(
    bytes: &[u8],
    opts: &RestoreOptions,
) -> Result<(StagedRestore, RestoreReport), RestoreError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut staged = StagedRestore::default();
    let mut report = RestoreReport::default();

    for file in RESTORE_ORDER {
        let Some(body) = read_entry(&mut archive, file)? else {
            tracing::warn!(file = file.file_name(), "archive has no such file, skipping");
            report.skipped.push(file.file_name().to_string());
            continue;
        };
        let sheet = Sheet::parse(file, &body)?;
        stage_file(&mut staged, file, &sheet)?;
        report.restored.push(file.file_name().to_string());
    }

    if let (Some(cap), Some(txs)) = (opts.max_transactions, staged.transactions.as_mut()) {
        if txs.len() > cap {
            report.truncated = txs.len() - cap;
            txs.truncate(cap);
        }
    }
    report.transactions = staged.transactions.as_ref().map_or(0, Vec::len);
    Ok((staged, report))
}

impl StagedRestore {
    fn into_batch(self) -> Result<Vec<BatchOp>, StoreError> {
        let mut ops = Vec::new();
        // Restored collections drop their legacy names, or an emptied
        // collection would fall back to stale data on the next load.
        let mut put = |key: StorageKey, op: BatchOp| {
            ops.extend(
                key.legacy()
                    .iter()
                    .map(|name| BatchOp::Delete(name.to_string())),
            );
            ops.push(op);
        };
        if let Some(v) = self.categories {
            let custom: Vec<Category> = v.into_iter().filter(|c| !c.is_default).collect();
            put(StorageKey::Categories, put_op(StorageKey::Categories.canonical(), &custom)?);
        }
        if let Some(v) = self.accounts {
            put(StorageKey::Accounts, put_op(StorageKey::Accounts.canonical(), &v)?);
        }
        if let Some(v) = self.goals {
            put(StorageKey::Goals, put_op(StorageKey::Goals.canonical(), &v)?);
        }
        if let Some(v) = self.transactions {
            put(StorageKey::Transactions, put_op(StorageKey::Transactions.canonical(), &v)?);
        }
        if let Some(v) = self.budget {
            put(StorageKey::Budgets, put_op(StorageKey::Budgets.canonical(), &v)?);
        }
        if let Some(v) = self.recurring_payments {
            put(
                StorageKey::RecurringPayments,
                put_op(StorageKey::RecurringPayments.canonical(), &v)?,
            );
        }
        if let Some(v) = self.recurring_rules {
            put(
                StorageKey::RecurringRules,
                put_op(StorageKey::RecurringRules.canonical(), &v)?,
            );
        }
        if let Some(v) = self.theme {
            put(StorageKey::Theme, put_op(StorageKey::Theme.canonical(), &v)?);
        }
        if let Some(v) = self.currency {
            put(StorageKey::Currency, put_op(StorageKey::Currency.canonical(), &v)?);
        }
        if let Some(v) = self.privacy_mode {
            put(StorageKey::PrivacyMode, put_op(StorageKey::PrivacyMode.canonical(), &v)?);
        }
        if let Some(v) = self.onboarding_complete {
            put(StorageKey::Onboarding, put_op(StorageKey::Onboarding.canonical(), &v)?);
        }
        Ok(ops)
    }
}

/// Restores an archive into `store`. Nothing is written unless every
/// present file validates.
pub fn restore_archive(
    bytes: &[u8],
    store: &KvStore,
    opts: &RestoreOptions,
) -> Result<RestoreReport, RestoreError> {
    let (staged, mut report) = stage_archive(bytes, opts)?;
    let batch = staged.into_batch()?;
    store.commit(&batch).into_result()?;
    report.reload_required = true;
    tracing::info!(
        restored = report.restored.len(),
        skipped = report.skipped.len(),
        transactions = report.transactions,
        "archive restored"
    );
    Ok(report)
}
