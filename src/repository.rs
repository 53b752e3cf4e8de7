// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::keys::StorageKey;
use crate::migrate::{self, MigrationContext};
use crate::models::{
    Frequency, RecurringRule, RecurringTransaction, Transaction, TransactionDraft,
    TransactionTemplate,
};
use crate::store::{KvStore, WriteStatus};
use crate::utils::{day_in_month, new_id, same_month};
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Any day within the wanted month.
    pub month: Option<NaiveDate>,
    pub account_id: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// Owns the transaction list and the recurring rules that feed it.
pub struct TransactionRepository<'s> {
    store: &'s KvStore,
    transactions: Vec<Transaction>,
    recurring: Vec<RecurringTransaction>,
}

impl<'s> TransactionRepository<'s> {
    pub fn load(store: &'s KvStore, ctx: &MigrationContext) -> Self {
        let transactions =
            migrate::load::<Vec<Transaction>>(store, StorageKey::Transactions, ctx)
                .unwrap_or_default();
        let recurring =
            migrate::load::<Vec<RecurringTransaction>>(store, StorageKey::RecurringRules, ctx)
                .unwrap_or_default();
        Self {
            store,
            transactions,
            recurring,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn recurring(&self) -> &[RecurringTransaction] {
        &self.recurring
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Newest date first; ties keep insertion order.
    pub fn list(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut rows: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|t| filter.month.is_none_or(|m| same_month(t.date, m)))
            .filter(|t| {
                filter
                    .account_id
                    .as_deref()
                    .is_none_or(|a| t.account_id == a)
            })
            .filter(|t| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| t.category.eq_ignore_ascii_case(c))
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }
        rows
    }

    pub fn add(&mut self, draft: TransactionDraft) -> Transaction {
        let tx = Transaction::from_draft(new_id(), draft);
        self.transactions.insert(0, tx.clone());
        self.persist_transactions();
        tx
    }

    /// Replaces every field but the id. Unknown ids are ignored.
    pub fn update(&mut self, id: &str, draft: TransactionDraft) -> bool {
        let Some(slot) = self.transactions.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        *slot = Transaction::from_draft(id.to_string(), draft);
        self.persist_transactions();
        true
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        if self.transactions.len() == before {
            return false;
        }
        self.persist_transactions();
        true
    }

    pub fn add_recurring(
        &mut self,
        rule: RecurringRule,
        template: TransactionTemplate,
    ) -> RecurringTransaction {
        let item = RecurringTransaction {
            id: new_id(),
            rule,
            template,
        };
        self.recurring.push(item.clone());
        self.persist_recurring();
        item
    }

    pub fn remove_recurring(&mut self, id: &str) -> bool {
        let before = self.recurring.len();
        self.recurring.retain(|r| r.id != id);
        if self.recurring.len() == before {
            return false;
        }
        self.persist_recurring();
        true
    }

    /// Materializes this month's instance of every active monthly rule whose
    /// day has arrived. A rule is skipped when the month already holds a
    /// transaction with the same account, category, amount and day, so
    /// repeated calls within a month add nothing.
    pub fn generate_recurring_instances(&mut self, today: NaiveDate) -> Vec<Transaction> {
        let mut created = Vec::new();
        for item in &self.recurring {
            if !item.rule.is_active || item.rule.frequency != Frequency::Monthly {
                continue;
            }
            let Some(date) = day_in_month(today, item.rule.day_of_month) else {
                continue;
            };
            if date > today {
                continue;
            }
            let t = &item.template;
            let exists = self.transactions.iter().any(|tx| {
                same_month(tx.date, date)
                    && tx.date.day() == date.day()
                    && tx.account_id == t.account_id
                    && tx.category == t.category
                    && tx.amount == t.amount
            });
            if exists {
                continue;
            }
            let tx = Transaction::from_draft(
                new_id(),
                TransactionDraft {
                    r#type: t.r#type,
                    amount: t.amount,
                    category: t.category.clone(),
                    date,
                    description: t.description.clone(),
                    account_id: t.account_id.clone(),
                    currency: t.currency.clone(),
                    tags: t.tags.clone(),
                    recurring_rule_id: Some(item.id.clone()),
                    is_recurring: true,
                },
            );
            self.transactions.insert(0, tx.clone());
            created.push(tx);
        }
        if !created.is_empty() {
            tracing::info!(count = created.len(), "generated recurring transactions");
            self.persist_transactions();
        }
        created
    }

    /// Writes both collections again; called when the process is about to
    /// exit so a failed earlier write gets another chance.
    pub fn flush(&self) -> WriteStatus {
        let first = self.persist_transactions();
        let second = self.persist_recurring();
        match (first, second) {
            (WriteStatus::Failed(e), _) | (_, WriteStatus::Failed(e)) => WriteStatus::Failed(e),
            _ => WriteStatus::Persisted,
        }
    }

    fn persist_transactions(&self) -> WriteStatus {
        self.store
            .set(StorageKey::Transactions.canonical(), &self.transactions)
    }

    fn persist_recurring(&self) -> WriteStatus {
        self.store
            .set(StorageKey::RecurringRules.canonical(), &self.recurring)
    }
}
