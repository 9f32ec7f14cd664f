//! The categorization and reporting engine.
//!
//! Data flows from the rule store through the classifier (transactions gain a category at
//! ingestion), through the sweeper (when rules are added), and finally through the filter,
//! aggregator and report builder when a summary is requested.
//!
//! # Consistency
//!
//! Writes that change categorization state are serialized per owner by `OwnerLocks`. Reads take
//! no lock. A report computed while a sweep is running may therefore see some transactions flip
//! from uncategorized to categorized between two reports; each report is internally consistent
//! because it aggregates a single query result.

mod aggregator;
mod classifier;
mod filter;
mod locks;
mod report;
mod rule_store;
mod sweeper;

pub use aggregator::{aggregate, Aggregate, CategoryTotal, LatestMonthTotals, MonthTotals};
pub use classifier::{classify, Classifier};
pub use filter::ReportFilter;
pub use locks::OwnerLocks;
pub use report::{build, Report, DEFAULT_TOP_N};
pub use rule_store::{parse_substrings, ParsedSubstrings};
pub use sweeper::{plan, SweepReport};

use crate::auth::AuthContext;
use crate::db::Db;
use crate::error::{not_found, validation};
use crate::model::{
    Account, AccountId, AddRulesOutcome, Category, CategoryDeletion, CategoryId, CategoryRef,
    Mapping, NewTransaction, Transaction, TransactionId,
};
use crate::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Ties the engine components to the storage collaborator.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Db,
    locks: OwnerLocks,
    sweeps: Arc<Mutex<JoinSet<()>>>,
}

impl Engine {
    pub(crate) fn new(db: Db) -> Self {
        Self {
            db,
            locks: OwnerLocks::new(),
            sweeps: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    // ---------------------------------------------------------------------------------------------
    // Rule store
    // ---------------------------------------------------------------------------------------------

    /// Adds the comma-separated substrings in `raw` as rules for `category_id`.
    ///
    /// Substrings already mapped for this owner, under any category, are returned in `skipped`.
    /// All new substrings are committed together with one insertion-sequence stamp, or none are.
    /// When at least one rule is added, a sweep of the owner's uncategorized transactions is
    /// started in the background; this call does not wait for it.
    ///
    /// # Errors
    /// - Validation error if `raw` contains no non-blank substring.
    /// - Not-found error if the category does not belong to the owner.
    pub async fn add_rules<S>(
        &self,
        auth: &AuthContext,
        category_id: CategoryId,
        raw: impl IntoIterator<Item = S>,
    ) -> Result<AddRulesOutcome>
    where
        S: AsRef<str>,
    {
        let parsed = parse_substrings(raw);
        if parsed.is_empty() {
            return Err(validation("At least one non-empty substring is required"));
        }

        let owner = auth.owner_id();
        let mut outcome = {
            let _guard = self.locks.lock(owner).await;
            self.db
                .insert_rules(owner, category_id, &parsed.tokens)
                .await?
        };
        outcome.skipped.extend(parsed.repeated);

        info!(
            "Added {} rule(s) to category {category_id} for owner {owner}, skipped {}",
            outcome.added.len(),
            outcome.skipped.len()
        );
        if !outcome.added.is_empty() {
            self.spawn_sweep(auth);
        }
        Ok(outcome)
    }

    /// One row per rule: the category it maps to and its substring.
    pub async fn list_mappings(&self, auth: &AuthContext) -> Result<Vec<Mapping>> {
        self.db.mappings(auth.owner_id()).await
    }

    /// The owner's substrings grouped by category name.
    pub async fn grouped_mappings(
        &self,
        auth: &AuthContext,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for m in self.list_mappings(auth).await? {
            grouped.entry(m.category).or_default().push(m.substring);
        }
        Ok(grouped)
    }

    // ---------------------------------------------------------------------------------------------
    // Categories
    // ---------------------------------------------------------------------------------------------

    pub async fn list_categories(&self, auth: &AuthContext) -> Result<Vec<Category>> {
        self.db.list_categories(auth.owner_id()).await
    }

    /// The category, or `None` if it does not exist or belongs to another owner.
    pub async fn category(
        &self,
        auth: &AuthContext,
        category_id: CategoryId,
    ) -> Result<Option<Category>> {
        self.db.get_category(auth.owner_id(), category_id).await
    }

    /// Creates a category. Names are trimmed, must not be blank, must not be the reserved
    /// `Uncategorized` name, and must be unique for the owner ignoring case.
    pub async fn create_category(&self, auth: &AuthContext, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(validation("Category name must not be empty"));
        }
        if Category::is_reserved_name(name) {
            return Err(validation(format!(
                "'{name}' is reserved for transactions without a category"
            )));
        }
        self.db.insert_category(auth.owner_id(), name).await
    }

    /// Deletes a category together with its rules. Transactions that referenced it become
    /// uncategorized; they are not reassigned to any other category.
    pub async fn delete_category(
        &self,
        auth: &AuthContext,
        category_id: CategoryId,
    ) -> Result<CategoryDeletion> {
        let owner = auth.owner_id();
        let _guard = self.locks.lock(owner).await;
        let deletion = self.db.delete_category(owner, category_id).await?;
        info!(
            "Deleted category '{}' for owner {owner}: {} rule(s) removed, {} transaction(s) now \
            uncategorized",
            deletion.category.name, deletion.rules_removed, deletion.transactions_uncategorized
        );
        Ok(deletion)
    }

    // ---------------------------------------------------------------------------------------------
    // Accounts and transactions
    // ---------------------------------------------------------------------------------------------

    pub async fn create_account(&self, auth: &AuthContext, name: &str) -> Result<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(validation("Account name must not be empty"));
        }
        self.db.insert_account(auth.owner_id(), name).await
    }

    pub async fn list_accounts(&self, auth: &AuthContext) -> Result<Vec<Account>> {
        self.db.list_accounts(auth.owner_id()).await
    }

    /// Stores transactions handed over by ingestion, classifying each one with the rules that are
    /// live at this moment.
    pub async fn ingest(
        &self,
        auth: &AuthContext,
        account_id: AccountId,
        transactions: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>> {
        let owner = auth.owner_id();
        if !self.db.account_belongs_to(owner, account_id).await? {
            return Err(not_found("Account not found"));
        }

        let _guard = self.locks.lock(owner).await;
        let rules = self.db.rules(owner).await?;
        let classifier = Classifier::new(&rules);
        let names: BTreeMap<CategoryId, String> = self
            .db
            .list_categories(owner)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let rows: Vec<(NewTransaction, Option<CategoryRef>)> = transactions
            .into_iter()
            .map(|t| {
                let category = classifier.classify(&t.description).and_then(|id| {
                    let name = names.get(&id)?;
                    Some(CategoryRef {
                        id,
                        name: name.clone(),
                    })
                });
                (t, category)
            })
            .collect();

        let inserted = self.db.insert_transactions(account_id, &rows).await?;
        let categorized = inserted.iter().filter(|t| t.is_categorized()).count();
        debug!(
            "Ingested {} transaction(s) into account {account_id}, {categorized} categorized",
            inserted.len()
        );
        Ok(inserted)
    }

    /// Sets or clears the category of a transaction by hand. A transaction given a category this
    /// way is never changed by a sweep; clearing it makes it eligible again.
    pub async fn set_category(
        &self,
        auth: &AuthContext,
        transaction_id: TransactionId,
        category_id: Option<CategoryId>,
    ) -> Result<Transaction> {
        let owner = auth.owner_id();
        let _guard = self.locks.lock(owner).await;
        self.db
            .set_transaction_category(owner, transaction_id, category_id)
            .await
    }

    // ---------------------------------------------------------------------------------------------
    // Sweeps
    // ---------------------------------------------------------------------------------------------

    /// Runs a sweep for the owner and waits for it.
    pub async fn sweep(&self, auth: &AuthContext) -> Result<SweepReport> {
        sweeper::sweep(&self.db, &self.locks, auth.owner_id()).await
    }

    fn spawn_sweep(&self, auth: &AuthContext) {
        let task = sweeper::sweep_in_background(self.db.clone(), self.locks.clone(), auth.owner_id());
        let mut sweeps = self.sweeps.lock().unwrap_or_else(|p| p.into_inner());
        sweeps.spawn(task);
    }

    /// Waits for every background sweep started so far.
    pub async fn wait_for_sweeps(&self) {
        let mut pending = {
            let mut sweeps = self.sweeps.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::take(&mut *sweeps)
        };
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!("A background sweep did not complete: {e}");
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Reports
    // ---------------------------------------------------------------------------------------------

    /// The owner's transactions that pass `filter`.
    pub async fn transactions(
        &self,
        auth: &AuthContext,
        filter: &ReportFilter,
    ) -> Result<Vec<Transaction>> {
        filter::resolve(&self.db, auth, filter).await
    }

    /// Builds the summary report for the transactions that pass `filter`.
    pub async fn report(
        &self,
        auth: &AuthContext,
        filter: &ReportFilter,
        top_n: usize,
    ) -> Result<Report> {
        let transactions = self.transactions(auth, filter).await?;
        debug!("Building a report from {} transaction(s)", transactions.len());
        Ok(build(aggregate(&transactions)?, top_n))
    }
}
