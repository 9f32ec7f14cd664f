//! Re-applies the owner's full rule set to transactions that are still uncategorized.
//!
//! A sweep only ever moves a transaction from uncategorized to a concrete category. Transactions
//! that already carry a category are never touched, whether a rule or the owner put it there.
//! Because classification is deterministic, running a sweep again over the same data reaches the
//! same result, so an interrupted sweep can simply be run again.

use crate::db::Db;
use crate::engine::{Classifier, OwnerLocks};
use crate::model::{CategoryId, OwnerId, Transaction, TransactionId};
use crate::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// The outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SweepReport {
    /// The number of uncategorized transactions that were looked at.
    pub examined: usize,
    /// The number of transactions that received a category.
    pub categorized: u64,
}

/// Decides which uncategorized transactions get which category. Categorized transactions are
/// skipped even if they are passed in.
pub fn plan(
    transactions: &[Transaction],
    classifier: &Classifier,
) -> Vec<(TransactionId, CategoryId)> {
    transactions
        .iter()
        .filter(|t| !t.is_categorized())
        .filter_map(|t| classifier.classify(&t.description).map(|c| (t.id, c)))
        .collect()
}

/// Runs a sweep for `owner`, waiting for the owner's lock first.
pub async fn sweep(db: &Db, locks: &OwnerLocks, owner: OwnerId) -> Result<SweepReport> {
    let _guard = locks.lock(owner).await;
    sweep_locked(db, owner).await
}

/// Runs a sweep for `owner`. The caller must hold the owner's lock.
async fn sweep_locked(db: &Db, owner: OwnerId) -> Result<SweepReport> {
    let rules = db.rules(owner).await?;
    let classifier = Classifier::new(&rules);
    let uncategorized = db.uncategorized_transactions(owner).await?;
    let examined = uncategorized.len();
    if classifier.is_empty() || uncategorized.is_empty() {
        debug!("Nothing to sweep for owner {owner}");
        return Ok(SweepReport {
            examined,
            categorized: 0,
        });
    }

    let assignments = plan(&uncategorized, &classifier);
    let categorized = db.assign_categories(&assignments).await?;
    info!("Sweep for owner {owner} categorized {categorized} of {examined} transactions");
    Ok(SweepReport {
        examined,
        categorized,
    })
}

/// Runs a sweep in the background. Errors are logged and never reach the request that triggered
/// the sweep; the next rule addition or a manual sweep picks up where this one left off.
pub(crate) async fn sweep_in_background(db: Db, locks: OwnerLocks, owner: OwnerId) {
    match sweep(&db, &locks, owner).await {
        Ok(report) => debug!("Background sweep for owner {owner} finished: {report:?}"),
        Err(e) => error!("Background sweep for owner {owner} failed: {e:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, CategoryRef, SubstringRule};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn txn(id: TransactionId, description: &str, category: Option<CategoryId>) -> Transaction {
        Transaction {
            id,
            account_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            description: description.to_string(),
            amount: Amount::from_str("-10.00").unwrap(),
            category: category.map(|id| CategoryRef {
                id,
                name: format!("cat-{id}"),
            }),
        }
    }

    fn rules() -> Vec<SubstringRule> {
        vec![
            SubstringRule {
                id: 1,
                owner_id: 1,
                category_id: 100,
                pattern: "star".into(),
                sequence: 1,
            },
            SubstringRule {
                id: 2,
                owner_id: 1,
                category_id: 200,
                pattern: "starbucks".into(),
                sequence: 2,
            },
        ]
    }

    #[test]
    fn test_plan_uses_full_rule_set() {
        // A transaction matching the newly added "starbucks" rule still goes to the earlier "star".
        let classifier = Classifier::new(&rules());
        let planned = plan(&[txn(1, "Starbucks #12", None)], &classifier);
        assert_eq!(planned, vec![(1, 100)]);
    }

    #[test]
    fn test_plan_never_touches_categorized() {
        let classifier = Classifier::new(&rules());
        let transactions = vec![
            txn(1, "Starbucks #12", Some(300)),
            txn(2, "Starlight Cinema", None),
            txn(3, "Gas station", None),
        ];
        let planned = plan(&transactions, &classifier);
        assert_eq!(planned, vec![(2, 100)]);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let classifier = Classifier::new(&rules());
        let mut transactions = vec![txn(1, "Starbucks", None), txn(2, "Other", None)];

        let first = plan(&transactions, &classifier);
        for (id, category) in &first {
            let t = transactions.iter_mut().find(|t| t.id == *id).unwrap();
            t.category = Some(CategoryRef {
                id: *category,
                name: String::new(),
            });
        }
        let second = plan(&transactions, &classifier);
        assert_eq!(first, vec![(1, 100)]);
        assert!(second.is_empty());
    }
}
