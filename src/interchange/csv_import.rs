// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bank-export CSV import.
//!
//! Four independent stages: [`tokenize`], [`detect_columns`], row mapping
//! and the row cap. The whole pipeline is pure; committing the preview is
//! the caller's job.

use crate::models::{TransactionDraft, TransactionType};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.\-]").unwrap());

/// Category ids an imported row can land in.
pub const CATEGORY_VOCABULARY: [&str; 12] = [
    "food",
    "transport",
    "shopping",
    "entertainment",
    "bills",
    "health",
    "education",
    "travel",
    "salary",
    "investment",
    "gifts",
    "other",
];

const FALLBACK_DATE_FORMATS: [&str; 10] = [
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%m/%d/%y",
];

/// Splits delimited text into trimmed cells. Handles quoted cells with `""`
/// escapes and any mix of `\r\n`, `\r` and `\n` line endings; blank rows are
/// dropped.
pub fn tokenize(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let text = drop_blanks_before_quotes(text);
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for rec in rdr.records() {
        match rec {
            Ok(rec) => {
                let row: Vec<String> = rec.iter().map(|c| c.to_string()).collect();
                if row.iter().any(|c| !c.is_empty()) {
                    rows.push(row);
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping unreadable CSV record"),
        }
    }
    rows
}

/// Removes spaces and tabs between a cell boundary and an opening quote, so
/// `a, "b,c"` reads as two cells. The csv reader only trims after parsing.
fn drop_blanks_before_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut in_quotes = false;
    let mut at_cell_start = true;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            out.push(ch);
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    out.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        if at_cell_start && (ch == ' ' || ch == '\t') {
            pending.push(ch);
            continue;
        }
        if ch == '"' && at_cell_start {
            in_quotes = true;
        } else {
            out.push_str(&pending);
        }
        pending.clear();
        out.push(ch);
        at_cell_start = matches!(ch, ',' | '\r' | '\n');
    }
    out.push_str(&pending);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Date,
    Amount,
    Type,
    Category,
    Description,
}

impl ColumnRole {
    const ORDER: [ColumnRole; 5] = [
        ColumnRole::Date,
        ColumnRole::Amount,
        ColumnRole::Type,
        ColumnRole::Category,
        ColumnRole::Description,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Date => &["date", "posted", "booked", "when"],
            ColumnRole::Amount => &["amount", "amt", "sum", "value", "total"],
            ColumnRole::Type => &["type", "kind", "direction", "debit/credit"],
            ColumnRole::Category => &["category", "categ", "group", "class"],
            ColumnRole::Description => &[
                "description",
                "desc",
                "note",
                "memo",
                "payee",
                "merchant",
                "details",
                "narrative",
            ],
        }
    }

    fn mandatory(self) -> bool {
        matches!(
            self,
            ColumnRole::Date | ColumnRole::Amount | ColumnRole::Category
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnRole::Date => "date",
            ColumnRole::Amount => "amount",
            ColumnRole::Type => "type",
            ColumnRole::Category => "category",
            ColumnRole::Description => "description",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column index per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub date: Option<usize>,
    pub amount: Option<usize>,
    pub r#type: Option<usize>,
    pub category: Option<usize>,
    pub description: Option<usize>,
}

impl ColumnMapping {
    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Date => self.date,
            ColumnRole::Amount => self.amount,
            ColumnRole::Type => self.r#type,
            ColumnRole::Category => self.category,
            ColumnRole::Description => self.description,
        }
    }

    fn set(&mut self, role: ColumnRole, idx: usize) {
        let slot = match role {
            ColumnRole::Date => &mut self.date,
            ColumnRole::Amount => &mut self.amount,
            ColumnRole::Type => &mut self.r#type,
            ColumnRole::Category => &mut self.category,
            ColumnRole::Description => &mut self.description,
        };
        *slot = Some(idx);
    }

    pub fn missing_mandatory(&self) -> Vec<ColumnRole> {
        ColumnRole::ORDER
            .into_iter()
            .filter(|r| r.mandatory() && self.get(*r).is_none())
            .collect()
    }
}

/// First header containing one of a role's keywords wins. A column is
/// claimed by at most one role.
pub fn detect_columns(headers: &[String]) -> ColumnMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let mut mapping = ColumnMapping::default();
    let mut taken = vec![false; headers.len()];
    for role in ColumnRole::ORDER {
        let hit = lowered.iter().enumerate().find(|(i, h)| {
            !taken[*i] && role.keywords().iter().any(|k| h.contains(*k))
        });
        if let Some((i, _)) = hit {
            taken[i] = true;
            mapping.set(role, i);
        }
    }
    mapping
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    /// 1-based, header excluded. 0 refers to the header itself.
    pub row: usize,
    pub field: String,
    pub message: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported_count: usize,
    pub errors: Vec<ImportError>,
    pub preview: Vec<TransactionDraft>,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub account_id: String,
    pub currency: String,
    /// Free-tier ceiling on accepted rows.
    pub max_rows: Option<usize>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            account_id: crate::entities::DEFAULT_ACCOUNT_ID.to_string(),
            currency: "USD".to_string(),
            max_rows: None,
        }
    }
}

/// Strict `YYYY-MM-DD` first, then common bank formats. A leading ISO date
/// followed by a time is accepted as its calendar day.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if s.len() > 10 && s.is_char_boundary(10) {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Keeps digits, `.` and `-`, parses, and returns the magnitude. Zero and
/// unparsable amounts give `None`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");
    let value = cleaned.parse::<Decimal>().ok()?.abs();
    if value.is_zero() { None } else { Some(value) }
}

fn parse_type(raw: &str) -> Option<TransactionType> {
    match raw.trim().to_lowercase().as_str() {
        "income" | "credit" | "deposit" | "in" | "cr" => Some(TransactionType::Income),
        "expense" | "debit" | "withdrawal" | "payment" | "out" | "dr" => {
            Some(TransactionType::Expense)
        }
        _ => None,
    }
}

/// Exact or substring match in either direction; `other` otherwise.
pub fn match_category(raw: &str) -> String {
    let c = raw.trim().to_lowercase();
    if c.is_empty() {
        return "other".to_string();
    }
    if let Some(exact) = CATEGORY_VOCABULARY.iter().find(|v| **v == c) {
        return exact.to_string();
    }
    CATEGORY_VOCABULARY
        .iter()
        .find(|v| c.contains(*v) || v.contains(c.as_str()))
        .map(|v| v.to_string())
        .unwrap_or_else(|| "other".to_string())
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|s| s.as_str()).unwrap_or("")
}

pub fn import_csv(text: &str, opts: &ImportOptions) -> ImportResult {
    let rows = tokenize(text);
    let Some((header, data)) = rows.split_first() else {
        return ImportResult {
            success: false,
            imported_count: 0,
            errors: vec![ImportError {
                row: 0,
                field: "file".into(),
                message: "file contains no rows".into(),
                value: String::new(),
            }],
            preview: Vec::new(),
        };
    };

    let mapping = detect_columns(header);
    let missing = mapping.missing_mandatory();
    if !missing.is_empty() {
        return ImportResult {
            success: false,
            imported_count: 0,
            errors: missing
                .into_iter()
                .map(|role| ImportError {
                    row: 0,
                    field: role.to_string(),
                    message: format!("no column found for {}", role),
                    value: header.join(","),
                })
                .collect(),
            preview: Vec::new(),
        };
    }

    let mut errors = Vec::new();
    let mut preview = Vec::new();
    for (i, row) in data.iter().enumerate() {
        if opts.max_rows.is_some_and(|cap| preview.len() >= cap) {
            tracing::info!(cap = ?opts.max_rows, "import row limit reached");
            break;
        }
        let row_no = i + 1;
        let err = |field: &str, message: &str, value: &str| ImportError {
            row: row_no,
            field: field.to_string(),
            message: message.to_string(),
            value: value.to_string(),
        };

        let date_raw = cell(row, mapping.date);
        let Some(date) = parse_flexible_date(date_raw) else {
            errors.push(err("date", "unrecognized date", date_raw));
            continue;
        };
        let amount_raw = cell(row, mapping.amount);
        let Some(amount) = parse_amount(amount_raw) else {
            errors.push(err("amount", "amount must be a non-zero number", amount_raw));
            continue;
        };
        let r#type = parse_type(cell(row, mapping.r#type)).unwrap_or(TransactionType::Expense);

        preview.push(TransactionDraft {
            r#type,
            amount,
            category: match_category(cell(row, mapping.category)),
            date,
            description: cell(row, mapping.description).to_string(),
            account_id: opts.account_id.clone(),
            currency: opts.currency.clone(),
            tags: Vec::new(),
            recurring_rule_id: None,
            is_recurring: false,
        });
    }

    ImportResult {
        success: !preview.is_empty(),
        imported_count: preview.len(),
        errors,
        preview,
    }
}
