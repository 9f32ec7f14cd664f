use crate::db::{Db, Storage};
use crate::error::not_found;
use crate::model::{pattern_key, AddRulesOutcome, CategoryId, Mapping, OwnerId, SubstringRule};
use crate::Result;
use std::collections::HashSet;
use tracing::debug;

impl Db {
    /// The owner's rules in precedence order.
    pub(crate) async fn rules(&self, owner: OwnerId) -> Result<Vec<SubstringRule>> {
        sqlx::query_as(
            "SELECT id, owner_id, category_id, pattern, sequence FROM substring_rules \
            WHERE owner_id = ? ORDER BY sequence, id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .storage("Failed to load rules")
    }

    /// One row per rule, joined with its category name.
    pub(crate) async fn mappings(&self, owner: OwnerId) -> Result<Vec<Mapping>> {
        sqlx::query_as(
            "SELECT r.category_id, c.name AS category, r.pattern AS substring \
            FROM substring_rules r JOIN categories c ON c.id = r.category_id \
            WHERE r.owner_id = ? ORDER BY c.name, r.sequence, r.id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .storage("Failed to list mappings")
    }

    /// Inserts every token that is not already mapped for the owner, all under one new sequence
    /// stamp. `tokens` must already be trimmed, non-empty and free of case-insensitive repeats.
    ///
    /// Nothing is written if the category does not belong to the owner.
    pub(crate) async fn insert_rules(
        &self,
        owner: OwnerId,
        category_id: CategoryId,
        tokens: &[String],
    ) -> Result<AddRulesOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .storage("Failed to begin adding rules")?;

        let category: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM categories WHERE id = ? AND owner_id = ?")
                .bind(category_id)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await
                .storage("Failed to look up the category")?;
        if category.is_none() {
            return Err(not_found("Category not found"));
        }

        let existing: HashSet<String> =
            sqlx::query_as::<_, (String,)>("SELECT pattern_key FROM substring_rules WHERE owner_id = ?")
                .bind(owner)
                .fetch_all(&mut *tx)
                .await
                .storage("Failed to load existing rules")?
                .into_iter()
                .map(|(key,)| key)
                .collect();

        let (new, skipped): (Vec<&String>, Vec<&String>) = tokens
            .iter()
            .partition(|t| !existing.contains(&pattern_key(t)));
        let skipped: Vec<String> = skipped.into_iter().cloned().collect();
        if new.is_empty() {
            debug!("Every substring is already mapped for owner {owner}");
            return Ok(AddRulesOutcome {
                added: Vec::new(),
                skipped,
            });
        }

        let (sequence,): (i64,) = sqlx::query_as(
            "UPDATE owners SET rule_sequence = rule_sequence + 1 WHERE id = ? \
            RETURNING rule_sequence",
        )
        .bind(owner)
        .fetch_one(&mut *tx)
        .await
        .storage("Failed to stamp the rule batch")?;

        let mut added = Vec::with_capacity(new.len());
        for pattern in new {
            let id = sqlx::query(
                "INSERT INTO substring_rules (owner_id, category_id, pattern, pattern_key, sequence) \
                VALUES (?, ?, ?, ?, ?)",
            )
            .bind(owner)
            .bind(category_id)
            .bind(pattern)
            .bind(pattern_key(pattern))
            .bind(sequence)
            .execute(&mut *tx)
            .await
            .storage("Failed to insert a rule")?
            .last_insert_rowid();
            added.push(SubstringRule {
                id,
                owner_id: owner,
                category_id,
                pattern: pattern.clone(),
                sequence,
            });
        }

        tx.commit().await.storage("Failed to commit the rule batch")?;
        Ok(AddRulesOutcome { added, skipped })
    }
}
