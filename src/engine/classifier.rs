//! Assigns a category to a transaction description using substring rules.

use crate::model::{pattern_key, CategoryId, RuleId, SubstringRule};

/// A rule set prepared for matching: patterns are normalized once and the rules are sorted so
/// that the first match found is the one that wins.
///
/// Matching is case-insensitive substring containment. When several rules match, the rule with
/// the lowest insertion sequence wins, and within the same sequence the lowest rule id. Storage
/// order of the input rules does not matter.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: Vec<PreparedRule>,
}

#[derive(Debug, Clone)]
struct PreparedRule {
    precedence: (i64, RuleId),
    key: String,
    category_id: CategoryId,
}

impl Classifier {
    pub fn new<'a>(rules: impl IntoIterator<Item = &'a SubstringRule>) -> Self {
        let mut prepared: Vec<PreparedRule> = rules
            .into_iter()
            .map(|r| PreparedRule {
                precedence: r.precedence(),
                key: r.key(),
                category_id: r.category_id,
            })
            // An empty pattern would match everything.
            .filter(|r| !r.key.is_empty())
            .collect();
        prepared.sort_by_key(|r| r.precedence);
        Self { rules: prepared }
    }

    /// Returns the category of the winning rule, or `None` if no rule matches.
    pub fn classify(&self, description: &str) -> Option<CategoryId> {
        let haystack = pattern_key(description);
        self.rules
            .iter()
            .find(|r| haystack.contains(r.key.as_str()))
            .map(|r| r.category_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Classifies a single description against `rules`. Prefer building a `Classifier` once when
/// classifying many descriptions.
pub fn classify(description: &str, rules: &[SubstringRule]) -> Option<CategoryId> {
    Classifier::new(rules).classify(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: RuleId, category_id: CategoryId, pattern: &str, sequence: i64) -> SubstringRule {
        SubstringRule {
            id,
            owner_id: 1,
            category_id,
            pattern: pattern.to_string(),
            sequence,
        }
    }

    const GROCERIES: CategoryId = 10;
    const RETAIL: CategoryId = 20;
    const COFFEE: CategoryId = 30;

    #[test]
    fn test_case_insensitive_containment() {
        let rules = vec![rule(1, GROCERIES, "Walmart", 1), rule(2, GROCERIES, "Costco", 1)];
        assert_eq!(classify("WALMART #4471", &rules), Some(GROCERIES));
        assert_eq!(classify("costco wholesale 12", &rules), Some(GROCERIES));
        assert_eq!(classify("Target", &rules), None);
    }

    #[test]
    fn test_earliest_sequence_wins() {
        let rules = vec![rule(1, RETAIL, "Star", 1), rule(2, COFFEE, "Starbucks", 2)];
        assert_eq!(classify("Starbucks Downtown", &rules), Some(RETAIL));
    }

    #[test]
    fn test_storage_order_does_not_matter() {
        // Same rules, stored in the opposite order and with the later rule having the lower id.
        let rules = vec![rule(1, COFFEE, "Starbucks", 2), rule(2, RETAIL, "Star", 1)];
        assert_eq!(classify("Starbucks Downtown", &rules), Some(RETAIL));
    }

    #[test]
    fn test_same_sequence_uses_id() {
        let rules = vec![rule(5, COFFEE, "bucks", 3), rule(4, RETAIL, "star", 3)];
        assert_eq!(classify("Starbucks", &rules), Some(RETAIL));
    }

    #[test]
    fn test_no_rules() {
        assert_eq!(classify("anything", &[]), None);
        assert!(Classifier::new(&Vec::<SubstringRule>::new()).is_empty());
    }

    #[test]
    fn test_blank_patterns_are_ignored() {
        let rules = vec![rule(1, RETAIL, "   ", 1), rule(2, COFFEE, "bean", 2)];
        let classifier = Classifier::new(&rules);
        assert_eq!(classifier.len(), 1);
        assert_eq!(classifier.classify("Mr Bean Coffee"), Some(COFFEE));
        assert_eq!(classifier.classify("Other"), None);
    }

    #[test]
    fn test_deterministic() {
        let rules = vec![
            rule(3, COFFEE, "coffee", 2),
            rule(1, RETAIL, "shop", 1),
            rule(2, GROCERIES, "market", 1),
        ];
        let first = classify("Coffee Shop Market", &rules);
        for _ in 0..10 {
            assert_eq!(classify("Coffee Shop Market", &rules), first);
        }
        assert_eq!(first, Some(RETAIL));
    }

    #[test]
    fn test_pattern_with_surrounding_whitespace() {
        let rules = vec![rule(1, GROCERIES, " Walmart ", 1)];
        assert_eq!(classify("walmart supercenter", &rules), Some(GROCERIES));
    }
}
