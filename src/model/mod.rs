//! Types that represent the core data model, such as `Transaction`, `Category` and
//! `SubstringRule`.
mod account;
mod amount;
mod category;
mod month;
mod rule;
mod transaction;

pub use account::Account;
pub use amount::{Amount, AmountError};
pub use category::{Category, CategoryDeletion, CategoryRef, UNCATEGORIZED};
pub use month::YearMonth;
pub(crate) use rule::pattern_key;
pub use rule::{AddRulesOutcome, Mapping, SubstringRule};
pub use transaction::{NewTransaction, Transaction};

/// Identifies the authenticated user that owns accounts, categories, rules and transactions.
pub type OwnerId = i64;
/// Identifies an account. Every account belongs to exactly one owner.
pub type AccountId = i64;
/// Identifies a category. Every category belongs to exactly one owner.
pub type CategoryId = i64;
/// Identifies a substring rule.
pub type RuleId = i64;
/// Identifies a transaction.
pub type TransactionId = i64;
