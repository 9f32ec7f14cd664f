use crate::model::{AccountId, Amount, CategoryRef, TransactionId, YearMonth};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A transaction as created by ingestion. Only `category` ever changes after creation, and only
/// through classification, a sweep, or an explicit correction by the owner.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Amount,
    pub category: Option<CategoryRef>,
}

impl Transaction {
    pub fn is_categorized(&self) -> bool {
        self.category.is_some()
    }

    /// The calendar month this transaction falls in.
    pub fn month(&self) -> YearMonth {
        YearMonth::from(self.date)
    }
}

/// A raw transaction handed over by the ingestion collaborator.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewTransaction {
    /// The date of the transaction, `YYYY-MM-DD`.
    #[schemars(with = "String")]
    pub date: NaiveDate,
    /// Free-text description as it appears on the statement.
    pub description: String,
    /// Signed amount. Positive is income, negative is an expense.
    #[schemars(with = "String")]
    pub amount: Amount,
}
