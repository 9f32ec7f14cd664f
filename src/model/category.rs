use crate::model::{CategoryId, OwnerId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The reserved bucket name for transactions that have no category. Owners cannot create a
/// category with this name.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A user-defined category. Names are unique per owner, compared case-insensitively.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: CategoryId,
    #[serde(skip)]
    pub owner_id: OwnerId,
    pub name: String,
}

impl Category {
    /// True if `name` is the reserved uncategorized bucket name, ignoring case and surrounding
    /// whitespace.
    pub fn is_reserved_name(name: &str) -> bool {
        Self::name_key(name) == Self::name_key(UNCATEGORIZED)
    }

    /// The key that makes names unique per owner: trimmed and lowercased, Unicode-aware.
    pub(crate) fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

/// The category reference carried by a transaction: enough to group it by name in reports.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

impl From<&Category> for CategoryRef {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

/// What happened when a category was deleted.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryDeletion {
    pub category: Category,
    /// The number of substring rules that pointed at the category and were removed with it.
    pub rules_removed: u64,
    /// The number of transactions that referenced the category and are now uncategorized.
    pub transactions_uncategorized: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_name() {
        assert!(Category::is_reserved_name("Uncategorized"));
        assert!(Category::is_reserved_name("  uncategorized "));
        assert!(!Category::is_reserved_name("Uncategorized stuff"));
        assert!(!Category::is_reserved_name("Groceries"));
    }
}
