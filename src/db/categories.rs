use crate::db::{is_unique_violation, Db, Storage};
use crate::error::{not_found, validation};
use crate::model::{Category, CategoryDeletion, CategoryId, OwnerId};
use crate::Result;

impl Db {
    /// Creates a category. Names are unique per owner ignoring case.
    pub(crate) async fn insert_category(&self, owner: OwnerId, name: &str) -> Result<Category> {
        let result =
            sqlx::query("INSERT INTO categories (owner_id, name, name_key) VALUES (?, ?, ?)")
                .bind(owner)
                .bind(name)
                .bind(Category::name_key(name))
                .execute(&self.pool)
                .await;
        match result {
            Ok(done) => Ok(Category {
                id: done.last_insert_rowid(),
                owner_id: owner,
                name: name.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(validation(format!("A category named '{name}' already exists")))
            }
            Err(e) => Err(e).storage("Failed to create the category"),
        }
    }

    /// The owner's categories ordered by name.
    pub(crate) async fn list_categories(&self, owner: OwnerId) -> Result<Vec<Category>> {
        sqlx::query_as(
            "SELECT id, owner_id, name FROM categories WHERE owner_id = ? ORDER BY name, id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .storage("Failed to list categories")
    }

    /// Returns the category only if it belongs to `owner`.
    pub(crate) async fn get_category(
        &self,
        owner: OwnerId,
        id: CategoryId,
    ) -> Result<Option<Category>> {
        sqlx::query_as("SELECT id, owner_id, name FROM categories WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .storage("Failed to look up the category")
    }

    /// Deletes the category and its rules, and clears it from every transaction, in one SQL
    /// transaction.
    pub(crate) async fn delete_category(
        &self,
        owner: OwnerId,
        id: CategoryId,
    ) -> Result<CategoryDeletion> {
        let mut tx = self
            .pool
            .begin()
            .await
            .storage("Failed to begin deleting the category")?;

        let category: Option<Category> = sqlx::query_as(
            "SELECT id, owner_id, name FROM categories WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await
        .storage("Failed to look up the category")?;
        let Some(category) = category else {
            return Err(not_found("Category not found"));
        };

        let rules_removed = sqlx::query("DELETE FROM substring_rules WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .storage("Failed to delete the category's rules")?
            .rows_affected();

        let transactions_uncategorized =
            sqlx::query("UPDATE transactions SET category_id = NULL WHERE category_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .storage("Failed to uncategorize the category's transactions")?
                .rows_affected();

        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .storage("Failed to delete the category")?;

        tx.commit()
            .await
            .storage("Failed to commit deleting the category")?;

        Ok(CategoryDeletion {
            category,
            rules_removed,
            transactions_uncategorized,
        })
    }
}
