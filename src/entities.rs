// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Entity collections other than transactions. Each book owns one
//! collection, loads it through the migrator and persists on every change.

use crate::keys::StorageKey;
use crate::migrate::{self, MigrationContext};
use crate::models::{
    Account, AccountType, Budget, Category, Frequency, Goal, RecurringPayment, Settings,
    Transaction, TransactionType,
};
use crate::store::{KvStore, WriteStatus};
use crate::utils::{new_id, same_month, slugify};
use chrono::{Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_ACCOUNT_ID: &str = "cash";

/// Budget rows use this id for the overall ceiling.
pub const OVERALL_BUDGET_ID: &str = "overall";

#[derive(Debug, Error, PartialEq)]
pub enum EntityError {
    #[error("'{0}' already exists")]
    Duplicate(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
}

pub fn default_accounts(currency: &str) -> Vec<Account> {
    [
        ("cash", "Cash", AccountType::Cash),
        ("bank", "Bank", AccountType::Bank),
        ("credit", "Credit", AccountType::Credit),
    ]
    .into_iter()
    .map(|(id, name, r#type)| Account {
        id: id.to_string(),
        name: name.to_string(),
        r#type,
        balance: Decimal::ZERO,
        currency: currency.to_string(),
    })
    .collect()
}

pub fn default_categories() -> Vec<Category> {
    [
        ("food", "Food & Dining", "🍔", "#f97316"),
        ("transport", "Transport", "🚗", "#3b82f6"),
        ("shopping", "Shopping", "🛍️", "#ec4899"),
        ("entertainment", "Entertainment", "🎬", "#8b5cf6"),
        ("bills", "Bills & Utilities", "💡", "#eab308"),
        ("health", "Health", "💊", "#ef4444"),
        ("education", "Education", "📚", "#14b8a6"),
        ("travel", "Travel", "✈️", "#06b6d4"),
        ("salary", "Salary", "💼", "#22c55e"),
        ("investment", "Investment", "📈", "#10b981"),
        ("gifts", "Gifts", "🎁", "#f43f5e"),
        ("other", "Other", "📦", "#6b7280"),
    ]
    .into_iter()
    .map(|(id, name, icon, color)| Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        is_default: true,
    })
    .collect()
}

/// Defaults first, then stored entries whose id is not taken yet.
pub fn merge_categories(stored: Vec<Category>) -> Vec<Category> {
    let mut all = default_categories();
    for c in stored {
        if !all.iter().any(|existing| existing.id == c.id) {
            all.push(c);
        }
    }
    all
}

pub struct AccountBook<'s> {
    store: &'s KvStore,
    accounts: Vec<Account>,
}

impl<'s> AccountBook<'s> {
    /// Seeds Cash/Bank/Credit only when no account key has ever been written.
    pub fn load(store: &'s KvStore, ctx: &MigrationContext) -> Self {
        let accounts = match migrate::load::<Vec<Account>>(store, StorageKey::Accounts, ctx) {
            Some(a) => a,
            None if migrate::any_source_present(store, StorageKey::Accounts) => Vec::new(),
            None => {
                let seeded = default_accounts(&ctx.default_currency);
                let book = Self {
                    store,
                    accounts: seeded,
                };
                book.persist();
                return book;
            }
        };
        Self { store, accounts }
    }

    pub fn list(&self) -> &[Account] {
        &self.accounts
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Looks an account up by id or, failing that, case-insensitive name.
    pub fn find(&self, id_or_name: &str) -> Option<&Account> {
        self.get(id_or_name).or_else(|| {
            self.accounts
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(id_or_name))
        })
    }

    pub fn add(
        &mut self,
        name: &str,
        r#type: AccountType,
        currency: &str,
        balance: Decimal,
    ) -> Result<Account, EntityError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EntityError::EmptyName);
        }
        if self.find(name).is_some() {
            return Err(EntityError::Duplicate(name.to_string()));
        }
        let account = Account {
            id: new_id(),
            name: name.to_string(),
            r#type,
            balance,
            currency: currency.trim().to_uppercase(),
        };
        self.accounts.push(account.clone());
        self.persist();
        Ok(account)
    }

    /// Rejected (returns false) when `id` is unknown or is the last account.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.accounts.len() <= 1 {
            tracing::warn!(id, "refusing to delete the last account");
            return false;
        }
        let before = self.accounts.len();
        self.accounts.retain(|a| a.id != id);
        if self.accounts.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn persist(&self) -> WriteStatus {
        self.store
            .set(StorageKey::Accounts.canonical(), &self.accounts)
    }
}

pub struct CategoryBook<'s> {
    store: &'s KvStore,
    categories: Vec<Category>,
}

impl<'s> CategoryBook<'s> {
    pub fn load(store: &'s KvStore, ctx: &MigrationContext) -> Self {
        let stored = migrate::load::<Vec<Category>>(store, StorageKey::Categories, ctx)
            .unwrap_or_default();
        Self {
            store,
            categories: merge_categories(stored),
        }
    }

    pub fn list(&self) -> &[Category] {
        &self.categories
    }

    pub fn add(&mut self, name: &str, icon: &str, color: &str) -> Result<Category, EntityError> {
        let id = slugify(name);
        if id.is_empty() {
            return Err(EntityError::EmptyName);
        }
        if self.categories.iter().any(|c| c.id == id) {
            return Err(EntityError::Duplicate(id));
        }
        let category = Category {
            id,
            name: name.trim().to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            is_default: false,
        };
        self.categories.push(category.clone());
        self.persist();
        Ok(category)
    }

    /// Default categories cannot be removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c.is_default || c.id != id);
        if self.categories.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Only user-added entries are stored; defaults are rebuilt on load.
    pub fn persist(&self) -> WriteStatus {
        let custom: Vec<&Category> = self.categories.iter().filter(|c| !c.is_default).collect();
        self.store
            .set(StorageKey::Categories.canonical(), &custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    /// `None` for the overall ceiling.
    pub category: Option<String>,
    pub limit: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub over_limit: bool,
}

impl BudgetLine {
    fn new(category: Option<String>, limit: Decimal, spent: Decimal) -> Self {
        Self {
            category,
            limit,
            spent,
            remaining: limit - spent,
            over_limit: spent > limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub month: String,
    pub overall: Option<BudgetLine>,
    pub categories: Vec<BudgetLine>,
}

pub struct BudgetBook<'s> {
    store: &'s KvStore,
    budget: Budget,
}

impl<'s> BudgetBook<'s> {
    pub fn load(store: &'s KvStore, ctx: &MigrationContext) -> Self {
        let budget = migrate::load::<Budget>(store, StorageKey::Budgets, ctx).unwrap_or_default();
        Self { store, budget }
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn set_overall(&mut self, limit: Option<Decimal>) -> WriteStatus {
        self.budget.overall = limit;
        self.persist()
    }

    /// `None` clears the category's limit.
    pub fn set_category(&mut self, category: &str, limit: Option<Decimal>) -> WriteStatus {
        match limit {
            Some(l) => {
                self.budget
                    .per_category
                    .insert(category.to_string(), Some(l));
            }
            None => {
                self.budget.per_category.remove(category);
            }
        }
        self.persist()
    }

    /// Compares limits with the expenses recorded in `month`.
    pub fn status(&self, month: NaiveDate, transactions: &[Transaction]) -> BudgetStatus {
        let expenses: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.r#type == TransactionType::Expense && same_month(t.date, month))
            .collect();
        let spent_in = |cat: Option<&str>| -> Decimal {
            expenses
                .iter()
                .filter(|t| cat.is_none_or(|c| t.category == c))
                .map(|t| t.amount)
                .sum()
        };
        let overall = self
            .budget
            .overall
            .map(|limit| BudgetLine::new(None, limit, spent_in(None)));
        let categories = self
            .budget
            .limits()
            .map(|(cat, limit)| BudgetLine::new(Some(cat.clone()), limit, spent_in(Some(cat.as_str()))))
            .collect();
        BudgetStatus {
            month: month.format("%Y-%m").to_string(),
            overall,
            categories,
        }
    }

    pub fn persist(&self) -> WriteStatus {
        self.store.set(StorageKey::Budgets.canonical(), &self.budget)
    }
}

#[derive(Debug, Clone)]
pub struct GoalDraft {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub category: String,
    pub description: String,
}

pub struct GoalBook<'s> {
    store: &'s KvStore,
    goals: Vec<Goal>,
}

impl<'s> GoalBook<'s> {
    pub fn load(store: &'s KvStore, ctx: &MigrationContext) -> Self {
        let goals = migrate::load::<Vec<Goal>>(store, StorageKey::Goals, ctx).unwrap_or_default();
        Self { store, goals }
    }

    pub fn list(&self) -> &[Goal] {
        &self.goals
    }

    pub fn add(&mut self, draft: GoalDraft) -> Result<Goal, EntityError> {
        if draft.name.trim().is_empty() {
            return Err(EntityError::EmptyName);
        }
        if draft.target_amount <= Decimal::ZERO {
            return Err(EntityError::NonPositiveAmount(draft.target_amount));
        }
        let mut goal = Goal {
            id: new_id(),
            name: draft.name.trim().to_string(),
            target_amount: draft.target_amount,
            current_amount: Decimal::ZERO,
            deadline: draft.deadline,
            category: draft.category,
            description: draft.description,
            created_at: Utc::now(),
        };
        goal.set_current(draft.current_amount);
        self.goals.push(goal.clone());
        self.persist();
        Ok(goal)
    }

    pub fn set_current(&mut self, id: &str, amount: Decimal) -> Option<Goal> {
        let goal = self.goals.iter_mut().find(|g| g.id == id)?;
        goal.set_current(amount);
        let updated = goal.clone();
        self.persist();
        Some(updated)
    }

    /// Adds `delta` (may be negative) to the saved amount.
    pub fn contribute(&mut self, id: &str, delta: Decimal) -> Option<Goal> {
        let current = self.goals.iter().find(|g| g.id == id)?.current_amount;
        self.set_current(id, current + delta)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.goals.len();
        self.goals.retain(|g| g.id != id);
        if self.goals.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn persist(&self) -> WriteStatus {
        self.store.set(StorageKey::Goals.canonical(), &self.goals)
    }
}

/// The date one `frequency` period after `date`. Month arithmetic clamps to
/// the end of shorter months.
pub fn advance(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    let next = match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Yearly => date.checked_add_months(Months::new(12)),
    };
    next.unwrap_or(date)
}

#[derive(Debug, Clone)]
pub struct BillDraft {
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub next_due_date: NaiveDate,
    pub frequency: Frequency,
}

/// Recurring payments (bill reminders).
pub struct BillBook<'s> {
    store: &'s KvStore,
    bills: Vec<RecurringPayment>,
}

impl<'s> BillBook<'s> {
    pub fn load(store: &'s KvStore, ctx: &MigrationContext) -> Self {
        let bills = migrate::load::<Vec<RecurringPayment>>(store, StorageKey::RecurringPayments, ctx)
            .unwrap_or_default();
        Self { store, bills }
    }

    pub fn list(&self) -> &[RecurringPayment] {
        &self.bills
    }

    pub fn add(&mut self, draft: BillDraft) -> Result<RecurringPayment, EntityError> {
        if draft.amount <= Decimal::ZERO {
            return Err(EntityError::NonPositiveAmount(draft.amount));
        }
        let bill = RecurringPayment {
            id: new_id(),
            description: draft.description,
            amount: draft.amount,
            currency: draft.currency.to_uppercase(),
            category: draft.category,
            next_due_date: draft.next_due_date,
            frequency: draft.frequency,
            is_active: true,
        };
        self.bills.push(bill.clone());
        self.persist();
        Ok(bill)
    }

    /// Moves the due date forward one period and returns it.
    pub fn mark_paid(&mut self, id: &str) -> Option<NaiveDate> {
        let bill = self.bills.iter_mut().find(|b| b.id == id)?;
        bill.next_due_date = advance(bill.next_due_date, bill.frequency);
        let due = bill.next_due_date;
        self.persist();
        Some(due)
    }

    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let bill = self.bills.iter_mut().find(|b| b.id == id)?;
        bill.is_active = !bill.is_active;
        let active = bill.is_active;
        self.persist();
        Some(active)
    }

    /// Active bills due on or before `until`, soonest first.
    pub fn due(&self, until: NaiveDate) -> Vec<&RecurringPayment> {
        let mut due: Vec<&RecurringPayment> = self
            .bills
            .iter()
            .filter(|b| b.is_active && b.next_due_date <= until)
            .collect();
        due.sort_by_key(|b| b.next_due_date);
        due
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.bills.len();
        self.bills.retain(|b| b.id != id);
        if self.bills.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn persist(&self) -> WriteStatus {
        self.store
            .set(StorageKey::RecurringPayments.canonical(), &self.bills)
    }
}

/// Preferences, each stored under its own key.
pub struct SettingsBook<'s> {
    store: &'s KvStore,
    settings: Settings,
}

impl<'s> SettingsBook<'s> {
    pub fn load(store: &'s KvStore, ctx: &MigrationContext) -> Self {
        let defaults = Settings::default();
        let settings = Settings {
            theme: migrate::load(store, StorageKey::Theme, ctx).unwrap_or(defaults.theme),
            currency: migrate::load(store, StorageKey::Currency, ctx).unwrap_or(defaults.currency),
            privacy_mode: migrate::load(store, StorageKey::PrivacyMode, ctx)
                .unwrap_or(defaults.privacy_mode),
            onboarding_complete: migrate::load(store, StorageKey::Onboarding, ctx)
                .unwrap_or(defaults.onboarding_complete),
        };
        Self { store, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_theme(&mut self, theme: &str) -> WriteStatus {
        self.settings.theme = theme.trim().to_lowercase();
        self.store
            .set(StorageKey::Theme.canonical(), &self.settings.theme)
    }

    pub fn set_currency(&mut self, currency: &str) -> WriteStatus {
        self.settings.currency = currency.trim().to_uppercase();
        self.store
            .set(StorageKey::Currency.canonical(), &self.settings.currency)
    }

    pub fn set_privacy_mode(&mut self, on: bool) -> WriteStatus {
        self.settings.privacy_mode = on;
        self.store.set(StorageKey::PrivacyMode.canonical(), &on)
    }

    pub fn set_onboarding_complete(&mut self, done: bool) -> WriteStatus {
        self.settings.onboarding_complete = done;
        self.store.set(StorageKey::Onboarding.canonical(), &done)
    }
}
