// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Storage key names, current and historical.

/// Every collection or setting persisted in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    Transactions,
    RecurringRules,
    Accounts,
    Categories,
    Budgets,
    Goals,
    RecurringPayments,
    Theme,
    Currency,
    PrivacyMode,
    Onboarding,
}

impl StorageKey {
    pub const ALL: [StorageKey; 11] = [
        StorageKey::Transactions,
        StorageKey::RecurringRules,
        StorageKey::Accounts,
        StorageKey::Categories,
        StorageKey::Budgets,
        StorageKey::Goals,
        StorageKey::RecurringPayments,
        StorageKey::Theme,
        StorageKey::Currency,
        StorageKey::PrivacyMode,
        StorageKey::Onboarding,
    ];

    /// The key current releases read and write.
    pub fn canonical(self) -> &'static str {
        self.names()[0]
    }

    /// Older names, highest priority first. Read by the migrator, never written.
    pub fn legacy(self) -> &'static [&'static str] {
        &self.names()[1..]
    }

    /// Canonical name followed by the legacy chain.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            StorageKey::Transactions => &[
                "pocketledger_transactions",
                "spendwise_transactions",
                "transactions",
            ],
            StorageKey::RecurringRules => &[
                "pocketledger_recurring",
                "spendwise_recurring",
                "recurringTransactions",
            ],
            StorageKey::Accounts => &["pocketledger_accounts", "spendwise_accounts"],
            StorageKey::Categories => &[
                "pocketledger_categories",
                "spendwise_categories",
                "customCategories",
            ],
            StorageKey::Budgets => &["pocketledger_budgets", "spendwise_budget", "budget"],
            StorageKey::Goals => &["pocketledger_goals", "spendwise_goals", "goals"],
            StorageKey::RecurringPayments => &[
                "pocketledger_recurring_payments",
                "spendwise_recurring_payments",
            ],
            StorageKey::Theme => &["pocketledger_theme", "spendwise_theme", "theme"],
            StorageKey::Currency => &["pocketledger_currency", "spendwise_currency", "currency"],
            StorageKey::PrivacyMode => &["pocketledger_privacy_mode", "spendwise_privacy_mode"],
            StorageKey::Onboarding => &[
                "pocketledger_onboarding_complete",
                "spendwise_onboarding_complete",
            ],
        }
    }

    /// Resolves a stored key name (canonical or legacy) to its collection.
    /// Exact matches only.
    pub fn resolve(name: &str) -> Option<StorageKey> {
        Self::ALL
            .into_iter()
            .find(|k| k.names().iter().any(|n| *n == name))
    }
}

