use crate::model::{CategoryId, OwnerId, RuleId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A rule that assigns `category_id` to any transaction whose description contains `pattern`,
/// compared case-insensitively.
///
/// `sequence` is the owner's insertion stamp for the batch this rule was added in. Lower
/// sequences win when several rules match; within one batch the lower `id` (input order) wins.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema, FromRow)]
pub struct SubstringRule {
    pub id: RuleId,
    #[serde(skip)]
    pub owner_id: OwnerId,
    pub category_id: CategoryId,
    pub pattern: String,
    pub sequence: i64,
}

impl SubstringRule {
    /// The key used for duplicate detection and matching.
    pub fn key(&self) -> String {
        pattern_key(&self.pattern)
    }

    /// The precedence of this rule. Smaller sorts first and wins.
    pub fn precedence(&self) -> (i64, RuleId) {
        (self.sequence, self.id)
    }
}

/// Normalizes a pattern (or description) for case-insensitive comparison.
pub(crate) fn pattern_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// One row of the mapping list: a substring and the name of the category it maps to.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, JsonSchema, FromRow,
)]
pub struct Mapping {
    pub category_id: CategoryId,
    pub category: String,
    pub substring: String,
}

/// The result of adding a batch of substrings to a category.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AddRulesOutcome {
    /// Rules that were created by this call.
    pub added: Vec<SubstringRule>,
    /// Substrings that were already mapped (under any category) and so were not added again.
    pub skipped: Vec<String>,
}
