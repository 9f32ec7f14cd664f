use crate::db::{is_unique_violation, Db, Storage};
use crate::error::validation;
use crate::model::{Account, AccountId, OwnerId};
use crate::Result;

impl Db {
    pub(crate) async fn insert_account(&self, owner: OwnerId, name: &str) -> Result<Account> {
        let result = sqlx::query("INSERT INTO accounts (owner_id, name) VALUES (?, ?)")
            .bind(owner)
            .bind(name)
            .execute(&self.pool)
            .await;
        match result {
            Ok(done) => Ok(Account {
                id: done.last_insert_rowid(),
                owner_id: owner,
                name: name.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(validation(format!("An account named '{name}' already exists")))
            }
            Err(e) => Err(e).storage("Failed to create the account"),
        }
    }

    pub(crate) async fn list_accounts(&self, owner: OwnerId) -> Result<Vec<Account>> {
        sqlx::query_as("SELECT id, owner_id, name FROM accounts WHERE owner_id = ? ORDER BY id")
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .storage("Failed to list accounts")
    }

    pub(crate) async fn account_belongs_to(
        &self,
        owner: OwnerId,
        account: AccountId,
    ) -> Result<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE id = ? AND owner_id = ?")
                .bind(account)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await
                .storage("Failed to look up the account")?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_accounts_are_scoped_to_owner() {
        let env = TestEnv::new().await;
        let other = env.other_owner().await;
        let db = env.db();

        let mine = db.insert_account(env.owner_id(), "Checking").await.unwrap();
        let theirs = db.insert_account(other.owner_id(), "Checking").await.unwrap();

        assert!(db.account_belongs_to(env.owner_id(), mine.id).await.unwrap());
        assert!(!db.account_belongs_to(env.owner_id(), theirs.id).await.unwrap());
        assert_eq!(db.list_accounts(env.owner_id()).await.unwrap(), vec![mine]);
    }

    #[tokio::test]
    async fn test_duplicate_account_name() {
        let env = TestEnv::new().await;
        let db = env.db();
        db.insert_account(env.owner_id(), "Savings").await.unwrap();
        assert!(db.insert_account(env.owner_id(), "Savings").await.is_err());
    }
}
