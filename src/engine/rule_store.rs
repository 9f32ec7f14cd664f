//! Turns the raw substring input of an "add mapping" request into the tokens that are stored.

use crate::model::pattern_key;
use std::collections::HashSet;

/// The tokens of a batch of substrings after splitting, trimming and removing blanks.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ParsedSubstrings {
    /// Distinct tokens in input order. The first spelling of a token is the one kept.
    pub tokens: Vec<String>,
    /// Tokens that repeat an earlier token of the same batch, ignoring case.
    pub repeated: Vec<String>,
}

impl ParsedSubstrings {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Splits each input on commas, trims every token, and discards empty tokens.
///
/// ```
/// # use expense_engine::engine::parse_substrings;
/// let parsed = parse_substrings(["Walmart, Costco", " ,walmart"]);
/// assert_eq!(parsed.tokens, vec!["Walmart", "Costco"]);
/// assert_eq!(parsed.repeated, vec!["walmart"]);
/// ```
pub fn parse_substrings<S>(raw: impl IntoIterator<Item = S>) -> ParsedSubstrings
where
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut parsed = ParsedSubstrings::default();
    for item in raw {
        for token in item.as_ref().split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if seen.insert(pattern_key(token)) {
                parsed.tokens.push(token.to_string());
            } else {
                parsed.repeated.push(token.to_string());
            }
        }
    }
    parsed
}
