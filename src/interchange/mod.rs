// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod archive;
pub mod backup;
pub mod csv_import;
pub mod restore;

/// One file of the structured archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFile {
    Categories,
    Accounts,
    Goals,
    Transactions,
    Budgets,
    RecurringPayments,
    RecurringRules,
    Settings,
    Onboarding,
    Metadata,
}

/// Archive files in write order.
pub fn manifest() -> [EntityFile; 10] {
    [
        EntityFile::Transactions,
        EntityFile::Accounts,
        EntityFile::Budgets,
        EntityFile::Goals,
        EntityFile::Categories,
        EntityFile::RecurringPayments,
        EntityFile::RecurringRules,
        EntityFile::Settings,
        EntityFile::Onboarding,
        EntityFile::Metadata,
    ]
}

impl EntityFile {
    pub fn file_name(self) -> &'static str {
        match self {
            EntityFile::Categories => "categories.csv",
            EntityFile::Accounts => "accounts.csv",
            EntityFile::Goals => "goals.csv",
            EntityFile::Transactions => "transactions.csv",
            EntityFile::Budgets => "budgets.csv",
            EntityFile::RecurringPayments => "recurring.csv",
            EntityFile::RecurringRules => "recurring_rules.csv",
            EntityFile::Settings => "settings.csv",
            EntityFile::Onboarding => "onboarding.csv",
            EntityFile::Metadata => "metadata.csv",
        }
    }

    /// Columns a restore insists on. Exports may add more.
    pub fn required_headers(self) -> &'static [&'static str] {
        match self {
            EntityFile::Categories => &["id", "name", "icon", "color", "isDefault"],
            EntityFile::Accounts => &["id", "name", "type", "balance", "currency"],
            EntityFile::Goals => &[
                "id",
                "name",
                "targetAmount",
                "currentAmount",
                "category",
                "deadline",
                "description",
                "createdAt",
            ],
            EntityFile::Transactions => &[
                "id",
                "type",
                "amount",
                "currency",
                "categoryId",
                "accountId",
                "date",
                "description",
                "tags",
                "isRecurring",
            ],
            EntityFile::Budgets => &["id", "categoryId", "limit", "period"],
            EntityFile::RecurringPayments => &[
                "id",
                "description",
                "amount",
                "currency",
                "categoryId",
                "nextDueDate",
                "frequency",
                "isActive",
            ],
            EntityFile::RecurringRules => &[
                "id",
                "type",
                "amount",
                "currency",
                "categoryId",
                "accountId",
                "description",
                "frequency",
                "dayOfMonth",
                "isActive",
            ],
            EntityFile::Settings | EntityFile::Onboarding | EntityFile::Metadata => {
                &["key", "value"]
            }
        }
    }

    /// Header row written on export.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            EntityFile::Transactions => &[
                "id",
                "type",
                "amount",
                "currency",
                "categoryId",
                "accountId",
                "date",
                "description",
                "tags",
                "isRecurring",
                "recurringRuleId",
            ],
            EntityFile::RecurringRules => &[
                "id",
                "type",
                "amount",
                "currency",
                "categoryId",
                "accountId",
                "description",
                "frequency",
                "dayOfMonth",
                "isActive",
                "tags",
            ],
            other => other.required_headers(),
        }
    }
}
