//! Assembles an `Aggregate` into the four views the summary page renders.

use crate::engine::aggregator::{Aggregate, CategoryTotal, LatestMonthTotals, MonthTotals};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The number of categories in `top_categories` when the caller does not say otherwise.
pub const DEFAULT_TOP_N: usize = 5;

/// The summary report. An empty transaction set produces zeroed totals and empty lists.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// Income and expense of the latest month in the filtered set.
    pub pie: LatestMonthTotals,
    /// Expense per category. The order carries no meaning.
    pub bar: Vec<CategoryTotal>,
    /// Income and expense per month, oldest first.
    pub line: Vec<MonthTotals>,
    /// The categories with the highest expense, highest first. Ties are ordered by name.
    pub top_categories: Vec<CategoryTotal>,
}

/// Builds the report from `aggregate`, keeping at most `top_n` entries in `top_categories`.
pub fn build(aggregate: Aggregate, top_n: usize) -> Report {
    let mut ranked = aggregate.by_category.clone();
    ranked.sort_by(|a, b| {
        b.total
            .value()
            .cmp(&a.total.value())
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(top_n);

    Report {
        pie: aggregate.latest_month,
        bar: aggregate.by_category,
        line: aggregate.by_month,
        top_categories: ranked,
    }
}
