// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Multi-file archive export: one CSV per collection, zipped.

use super::{manifest, EntityFile};
use crate::entities::{merge_categories, OVERALL_BUDGET_ID};
use crate::keys::StorageKey;
use crate::migrate::{self, MigrationContext};
use crate::models::{
    Account, Budget, Category, Goal, RecurringPayment, RecurringTransaction, Settings,
    Transaction, TransactionType,
};
use crate::store::KvStore;
use crate::utils::{capitalize, currency_symbol};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use std::io::{Cursor, Write};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

pub const TAG_SEPARATOR: &str = ";";

/// Everything the export covers, read in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSnapshot {
    pub transactions: Vec<Transaction>,
    pub accounts: Vec<Account>,
    pub budget: Budget,
    pub goals: Vec<Goal>,
    pub categories: Vec<Category>,
    pub recurring_rules: Vec<RecurringTransaction>,
    pub recurring_payments: Vec<RecurringPayment>,
    pub settings: Settings,
}

impl DataSnapshot {
    pub fn load(store: &KvStore, ctx: &MigrationContext) -> Self {
        let defaults = Settings::default();
        Self {
            transactions: migrate::load(store, StorageKey::Transactions, ctx).unwrap_or_default(),
            accounts: migrate::load(store, StorageKey::Accounts, ctx).unwrap_or_default(),
            budget: migrate::load(store, StorageKey::Budgets, ctx).unwrap_or_default(),
            goals: migrate::load(store, StorageKey::Goals, ctx).unwrap_or_default(),
            categories: merge_categories(
                migrate::load(store, StorageKey::Categories, ctx).unwrap_or_default(),
            ),
            recurring_rules: migrate::load(store, StorageKey::RecurringRules, ctx)
                .unwrap_or_default(),
            recurring_payments: migrate::load(store, StorageKey::RecurringPayments, ctx)
                .unwrap_or_default(),
            settings: Settings {
                theme: migrate::load(store, StorageKey::Theme, ctx).unwrap_or(defaults.theme),
                currency: migrate::load(store, StorageKey::Currency, ctx)
                    .unwrap_or(defaults.currency),
                privacy_mode: migrate::load(store, StorageKey::PrivacyMode, ctx)
                    .unwrap_or(defaults.privacy_mode),
                onboarding_complete: migrate::load(store, StorageKey::Onboarding, ctx)
                    .unwrap_or(defaults.onboarding_complete),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportMeta {
    pub app_name: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub timezone: String,
}

impl Default for ExportMeta {
    fn default() -> Self {
        Self {
            app_name: "PocketLedger".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            timezone: Local::now().offset().to_string(),
        }
    }
}

fn write_csv(headers: &[&str], rows: Vec<Vec<String>>) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e.error()))
}

fn opt_string<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(|x| x.to_string()).unwrap_or_default()
}

/// Renders the CSV body of one archive file.
pub fn render_file(file: EntityFile, snap: &DataSnapshot, meta: &ExportMeta) -> Result<Vec<u8>> {
    let headers = file.headers();
    let rows: Vec<Vec<String>> = match file {
        EntityFile::Transactions => snap
            .transactions
            .iter()
            .map(|t| {
                vec![
                    t.id.clone(),
                    t.r#type.as_str().to_string(),
                    t.amount.to_string(),
                    t.currency.clone(),
                    t.category.clone(),
                    t.account_id.clone(),
                    t.date.to_string(),
                    t.description.clone(),
                    t.tags.join(TAG_SEPARATOR),
                    t.is_recurring.to_string(),
                    opt_string(&t.recurring_rule_id),
                ]
            })
            .collect(),
        EntityFile::Accounts => snap
            .accounts
            .iter()
            .map(|a| {
                vec![
                    a.id.clone(),
                    a.name.clone(),
                    a.r#type.as_str().to_string(),
                    a.balance.to_string(),
                    a.currency.clone(),
                ]
            })
            .collect(),
        EntityFile::Budgets => {
            let mut rows = Vec::new();
            if let Some(overall) = snap.budget.overall {
                rows.push(vec![
                    format!("budget-{}", OVERALL_BUDGET_ID),
                    OVERALL_BUDGET_ID.to_string(),
                    overall.to_string(),
                    "monthly".to_string(),
                ]);
            }
            for (cat, limit) in snap.budget.limits() {
                rows.push(vec![
                    format!("budget-{}", cat),
                    cat.clone(),
                    limit.to_string(),
                    "monthly".to_string(),
                ]);
            }
            rows
        }
        EntityFile::Goals => snap
            .goals
            .iter()
            .map(|g| {
                vec![
                    g.id.clone(),
                    g.name.clone(),
                    g.target_amount.to_string(),
                    g.current_amount.to_string(),
                    g.category.clone(),
                    opt_string(&g.deadline),
                    g.description.clone(),
                    g.created_at.to_rfc3339(),
                ]
            })
            .collect(),
        EntityFile::Categories => snap
            .categories
            .iter()
            .map(|c| {
                vec![
                    c.id.clone(),
                    c.name.clone(),
                    c.icon.clone(),
                    c.color.clone(),
                    c.is_default.to_string(),
                ]
            })
            .collect(),
        EntityFile::RecurringPayments => snap
            .recurring_payments
            .iter()
            .map(|b| {
                vec![
                    b.id.clone(),
                    b.description.clone(),
                    b.amount.to_string(),
                    b.currency.clone(),
                    b.category.clone(),
                    b.next_due_date.to_string(),
                    b.frequency.to_string(),
                    b.is_active.to_string(),
                ]
            })
            .collect(),
        EntityFile::RecurringRules => snap
            .recurring_rules
            .iter()
            .map(|r| {
                let t = &r.template;
                vec![
                    r.id.clone(),
                    t.r#type.as_str().to_string(),
                    t.amount.to_string(),
                    t.currency.clone(),
                    t.category.clone(),
                    t.account_id.clone(),
                    t.description.clone(),
                    r.rule.frequency.to_string(),
                    r.rule.day_of_month.to_string(),
                    r.rule.is_active.to_string(),
                    t.tags.join(TAG_SEPARATOR),
                ]
            })
            .collect(),
        EntityFile::Settings => vec![
            vec!["theme".into(), snap.settings.theme.clone()],
            vec!["currency".into(), snap.settings.currency.clone()],
            vec!["privacyMode".into(), snap.settings.privacy_mode.to_string()],
        ],
        EntityFile::Onboarding => vec![vec![
            "onboardingComplete".into(),
            snap.settings.onboarding_complete.to_string(),
        ]],
        EntityFile::Metadata => vec![
            vec!["appName".into(), meta.app_name.clone()],
            vec!["version".into(), meta.version.clone()],
            vec!["exportedAt".into(), meta.exported_at.to_rfc3339()],
            vec!["timezone".into(), meta.timezone.clone()],
        ],
    };
    write_csv(headers, rows).with_context(|| format!("Failed to render {}", file.file_name()))
}

/// Bundles every collection into a ZIP archive.
pub fn export_archive(snap: &DataSnapshot, meta: &ExportMeta) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for file in manifest() {
            let body = render_file(file, snap, meta)?;
            zip.start_file(file.file_name(), options)
                .with_context(|| format!("Failed to add {}", file.file_name()))?;
            zip.write_all(&body)
                .with_context(|| format!("Failed to write {}", file.file_name()))?;
        }
        zip.finish().context("Failed to finalize archive")?;
    }
    Ok(cursor.into_inner())
}

/// Spreadsheet-friendly transaction list: BOM, human dates, capitalized
/// categories, currency symbol in the amount header only.
pub fn export_transactions_csv(transactions: &[Transaction], currency: &str) -> Result<String> {
    let amount_header = format!("Amount ({})", currency_symbol(currency));
    let rows = transactions
        .iter()
        .map(|t| {
            vec![
                t.date.format("%d %b %Y").to_string(),
                match t.r#type {
                    TransactionType::Income => "Income".to_string(),
                    TransactionType::Expense => "Expense".to_string(),
                },
                capitalize(&t.category),
                t.amount.to_string(),
                t.description.clone(),
            ]
        })
        .collect();
    let body = write_csv(&["Date", "Type", "Category", &amount_header, "Note"], rows)?;
    let text = String::from_utf8(body).context("CSV output was not UTF-8")?;
    Ok(format!("\u{feff}{}", text))
}
