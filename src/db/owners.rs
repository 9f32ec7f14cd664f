use crate::db::{is_unique_violation, Db, Storage};
use crate::error::validation;
use crate::model::OwnerId;
use crate::Result;

impl Db {
    /// Registers an owner who authenticates with `token`.
    pub(crate) async fn insert_owner(&self, name: &str, token: &str) -> Result<OwnerId> {
        let result = sqlx::query("INSERT INTO owners (name, token) VALUES (?, ?)")
            .bind(name)
            .bind(token)
            .execute(&self.pool)
            .await;
        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(validation(format!("An owner named '{name}' already exists")))
            }
            Err(e) => Err(e).storage("Failed to create the owner"),
        }
    }

    /// Finds the id and name of the owner holding `token`.
    pub(crate) async fn owner_by_token(&self, token: &str) -> Result<Option<(OwnerId, String)>> {
        sqlx::query_as("SELECT id, name FROM owners WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .storage("Failed to look up the credential")
    }
}
