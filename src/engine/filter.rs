//! Resolves a report request into the set of transactions to aggregate.

use crate::auth::AuthContext;
use crate::db::Db;
use crate::error::PubError;
use crate::model::{CategoryId, Transaction};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A validated report filter. Build it from untyped request parameters with
/// `ReportFilter::parse`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Inclusive lower bound on the transaction date.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date.
    pub end_date: Option<NaiveDate>,
    /// Only transactions carrying this category.
    pub category_id: Option<CategoryId>,
}

impl ReportFilter {
    /// Parses the optional `start_date`, `end_date` and `category_id` request parameters. Blank
    /// strings count as absent. Every unparseable parameter is reported, not just the first.
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        category_id: Option<&str>,
    ) -> Result<Self> {
        let mut problems = Vec::new();
        let start_date = parse_param(start_date, "start_date", &mut problems, parse_date);
        let end_date = parse_param(end_date, "end_date", &mut problems, parse_date);
        let category_id = parse_param(category_id, "category_id", &mut problems, |s| {
            s.parse::<CategoryId>().ok()
        });
        if !problems.is_empty() {
            return Err(PubError::validation_items(problems).into());
        }
        Ok(Self {
            start_date,
            end_date,
            category_id,
        })
    }

    /// True if the end date is before the start date. Such a filter selects nothing.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start_date, self.end_date), (Some(s), Some(e)) if e < s)
    }

    /// Whether `transaction` passes this filter. Ownership is not checked here. The SQL built by
    /// `Db::query_transactions` is checked against this in tests.
    #[cfg(test)]
    pub(crate) fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(start) = self.start_date {
            if transaction.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if transaction.date > end {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if transaction.category.as_ref().map(|c| c.id) != Some(category_id) {
                return false;
            }
        }
        true
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_param<T>(
    value: Option<&str>,
    name: &str,
    problems: &mut Vec<String>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let value = value.map(str::trim).filter(|s| !s.is_empty())?;
    let parsed = parse(value);
    if parsed.is_none() {
        problems.push(format!("Invalid {name} '{value}'"));
    }
    parsed
}

/// Returns the owner's transactions that pass `filter`.
///
/// An inverted date range, or a category that does not belong to the owner, yields an empty set
/// rather than an error, so that the existence of other owners' categories is not revealed.
pub async fn resolve(
    db: &Db,
    auth: &AuthContext,
    filter: &ReportFilter,
) -> Result<Vec<Transaction>> {
    if filter.is_inverted() {
        debug!("End date is before start date, nothing to select");
        return Ok(Vec::new());
    }
    if let Some(category_id) = filter.category_id {
        if db.get_category(auth.owner_id(), category_id).await?.is_none() {
            debug!("Category {category_id} does not belong to the owner, nothing to select");
            return Ok(Vec::new());
        }
    }
    db.query_transactions(auth.owner_id(), filter).await
}
