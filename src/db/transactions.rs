use crate::db::{Db, Storage, DATE_FORMAT};
use crate::engine::ReportFilter;
use crate::error::not_found;
use crate::model::{
    AccountId, Amount, CategoryId, CategoryRef, NewTransaction, OwnerId, Transaction,
    TransactionId,
};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;

/// Transactions joined with their account (for ownership) and category (for the name).
const SELECT_TRANSACTIONS: &str = "SELECT t.id, t.account_id, t.date, t.description, t.amount, \
    t.category_id, c.name AS category_name \
    FROM transactions t \
    JOIN accounts a ON a.id = t.account_id \
    LEFT JOIN categories c ON c.id = t.category_id";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    account_id: i64,
    date: String,
    description: String,
    amount: String,
    category_id: Option<i64>,
    category_name: Option<String>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .with_context(|| format!("Transaction {} has an invalid date '{}'", row.id, row.date))?;
        let amount = Amount::from_str(&row.amount).with_context(|| {
            format!("Transaction {} has an invalid amount '{}'", row.id, row.amount)
        })?;
        let category = match (row.category_id, row.category_name) {
            (Some(id), Some(name)) => Some(CategoryRef { id, name }),
            _ => None,
        };
        Ok(Transaction {
            id: row.id,
            account_id: row.account_id,
            date,
            description: row.description,
            amount,
            category,
        })
    }
}

fn into_transactions(rows: Vec<TransactionRow>) -> Result<Vec<Transaction>> {
    rows.into_iter().map(Transaction::try_from).collect()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl Db {
    /// Stores transactions for `account_id`, each with the category it was classified into.
    /// The caller is responsible for checking that the account and categories belong to the same
    /// owner.
    pub(crate) async fn insert_transactions(
        &self,
        account_id: AccountId,
        rows: &[(NewTransaction, Option<CategoryRef>)],
    ) -> Result<Vec<Transaction>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .storage("Failed to begin inserting transactions")?;

        let mut inserted = Vec::with_capacity(rows.len());
        for (new, category) in rows {
            let id = sqlx::query(
                "INSERT INTO transactions (account_id, date, description, amount, category_id) \
                VALUES (?, ?, ?, ?, ?)",
            )
            .bind(account_id)
            .bind(format_date(new.date))
            .bind(&new.description)
            .bind(new.amount.value().to_string())
            .bind(category.as_ref().map(|c| c.id))
            .execute(&mut *tx)
            .await
            .storage("Failed to insert a transaction")?
            .last_insert_rowid();

            inserted.push(Transaction {
                id,
                account_id,
                date: new.date,
                description: new.description.clone(),
                amount: new.amount,
                category: category.clone(),
            });
        }

        tx.commit()
            .await
            .storage("Failed to commit inserting transactions")?;
        Ok(inserted)
    }

    pub(crate) async fn get_transaction(
        &self,
        owner: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TRANSACTIONS} WHERE t.id = ? AND a.owner_id = ?"))
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await
                .storage("Failed to look up the transaction")?;
        row.map(Transaction::try_from).transpose()
    }

    /// The owner's transactions that have no category, oldest first.
    pub(crate) async fn uncategorized_transactions(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{SELECT_TRANSACTIONS} WHERE a.owner_id = ? AND t.category_id IS NULL ORDER BY t.id"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .storage("Failed to load uncategorized transactions")?;
        into_transactions(rows)
    }

    /// Applies sweep results. A transaction that gained a category since it was read keeps that
    /// category. Returns the number of transactions that changed.
    pub(crate) async fn assign_categories(
        &self,
        assignments: &[(TransactionId, CategoryId)],
    ) -> Result<u64> {
        if assignments.is_empty() {
            return Ok(0);
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .storage("Failed to begin assigning categories")?;
        let mut changed = 0;
        for (transaction_id, category_id) in assignments {
            changed += sqlx::query(
                "UPDATE transactions SET category_id = ? WHERE id = ? AND category_id IS NULL",
            )
            .bind(category_id)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await
            .storage("Failed to assign a category")?
            .rows_affected();
        }
        tx.commit()
            .await
            .storage("Failed to commit assigning categories")?;
        Ok(changed)
    }

    /// Sets or clears the category of one of the owner's transactions.
    pub(crate) async fn set_transaction_category(
        &self,
        owner: OwnerId,
        id: TransactionId,
        category_id: Option<CategoryId>,
    ) -> Result<Transaction> {
        if self.get_transaction(owner, id).await?.is_none() {
            return Err(not_found("Transaction not found"));
        }
        if let Some(category_id) = category_id {
            if self.get_category(owner, category_id).await?.is_none() {
                return Err(not_found("Category not found"));
            }
        }
        sqlx::query("UPDATE transactions SET category_id = ? WHERE id = ?")
            .bind(category_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .storage("Failed to update the transaction")?;
        self.get_transaction(owner, id)
            .await?
            .ok_or_else(|| not_found("Transaction not found"))
    }

    /// The owner's transactions that pass `filter`, oldest first. The category is not checked for
    /// ownership here; a foreign category simply matches none of the owner's transactions.
    pub(crate) async fn query_transactions(
        &self,
        owner: OwnerId,
        filter: &ReportFilter,
    ) -> Result<Vec<Transaction>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_TRANSACTIONS);
        query.push(" WHERE a.owner_id = ").push_bind(owner);
        if let Some(start) = filter.start_date {
            query.push(" AND t.date >= ").push_bind(format_date(start));
        }
        if let Some(end) = filter.end_date {
            query.push(" AND t.date <= ").push_bind(format_date(end));
        }
        if let Some(category_id) = filter.category_id {
            query.push(" AND t.category_id = ").push_bind(category_id);
        }
        query.push(" ORDER BY t.date, t.id");

        let rows: Vec<TransactionRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .storage("Failed to query transactions")?;
        into_transactions(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_round_trip_through_storage() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let stored = env
            .transaction(account.id, "2025-03-02", "Rent March", "-1200.00")
            .await;
        let db = env.db();
        let loaded = db
            .get_transaction(env.owner_id(), stored.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.amount.to_string(), "-1200.00");
    }

    #[tokio::test]
    async fn test_query_matches_filter() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        for (date, amount) in [
            ("2025-02-28", "-1.00"),
            ("2025-03-01", "-2.00"),
            ("2025-03-31", "-3.00"),
            ("2025-04-01", "-4.00"),
        ] {
            env.transaction(account.id, date, "x", amount).await;
        }
        let db = env.db();
        let filter = ReportFilter::parse(Some("2025-03-01"), Some("2025-03-31"), None).unwrap();

        let all = db
            .query_transactions(env.owner_id(), &ReportFilter::default())
            .await
            .unwrap();
        let selected = db.query_transactions(env.owner_id(), &filter).await.unwrap();

        let expected: Vec<Transaction> = all.into_iter().filter(|t| filter.matches(t)).collect();
        assert_eq!(selected, expected);
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_other_owners_transactions_are_invisible() {
        let env = TestEnv::new().await;
        let other = env.other_owner().await;
        let db = env.db();
        let theirs = db.insert_account(other.owner_id(), "Theirs").await.unwrap();
        let txn = env
            .transaction(theirs.id, "2025-03-01", "Private", "-9.99")
            .await;

        assert!(db
            .get_transaction(env.owner_id(), txn.id)
            .await
            .unwrap()
            .is_none());
        assert!(db
            .query_transactions(env.owner_id(), &ReportFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_assign_never_overwrites() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let rent = env.category("Rent").await;
        let misc = env.category("Misc").await;
        let txn = env
            .transaction(account.id, "2025-03-01", "Landlord", "-100.00")
            .await;
        let db = env.db();

        db.set_transaction_category(env.owner_id(), txn.id, Some(rent.id))
            .await
            .unwrap();
        let changed = db.assign_categories(&[(txn.id, misc.id)]).await.unwrap();

        assert_eq!(changed, 0);
        let loaded = db
            .get_transaction(env.owner_id(), txn.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.category.unwrap().name, "Rent");
    }
}
