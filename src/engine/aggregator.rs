//! Computes the grouped sums that reports are built from.

use crate::error::validation;
use crate::model::{Amount, Transaction, YearMonth, UNCATEGORIZED};
use crate::Result;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The total expense magnitude of one category.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryTotal {
    /// The category name, or `Uncategorized` for transactions without a category.
    pub category: String,
    #[schemars(with = "f64")]
    pub total: Amount,
}

/// Income and expense sums for one calendar month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthTotals {
    /// The month, `YYYY-MM`.
    #[schemars(with = "String")]
    pub month: YearMonth,
    #[schemars(with = "f64")]
    pub total_income: Amount,
    #[schemars(with = "f64")]
    pub total_expense: Amount,
}

/// Income and expense sums for the most recent month of a transaction set. `month` is `None` when
/// the set is empty, in which case both totals are zero.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LatestMonthTotals {
    #[schemars(with = "f64")]
    pub total_income: Amount,
    #[schemars(with = "f64")]
    pub total_expense: Amount,
    #[schemars(with = "Option<String>")]
    pub month: Option<YearMonth>,
}

/// Everything the report builder needs, computed in one pass over the transactions.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Expense magnitude per category name, sorted by name. Categories whose total is zero are
    /// left out. Transactions without a category are counted under `Uncategorized`.
    pub by_category: Vec<CategoryTotal>,
    /// Income and expense per month, oldest first.
    pub by_month: Vec<MonthTotals>,
    /// The totals of the last entry of `by_month`.
    pub latest_month: LatestMonthTotals,
}

#[derive(Default)]
struct Sums {
    income: Decimal,
    expense: Decimal,
}

/// Adds `value` to `total`, failing instead of overflowing.
fn accumulate(total: &mut Decimal, value: Decimal) -> Result<()> {
    *total = total.checked_add(value).ok_or_else(|| {
        validation("The selected transactions sum to more than can be represented exactly")
    })?;
    Ok(())
}

/// Aggregates `transactions`. Income is the sum of positive amounts and expense the sum of the
/// absolute values of negative amounts. All sums are exact decimals.
///
/// # Errors
/// - Validation error if a sum exceeds the range of `Decimal`.
pub fn aggregate<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Result<Aggregate> {
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut by_month: BTreeMap<YearMonth, Sums> = BTreeMap::new();

    for t in transactions {
        let name = t
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(UNCATEGORIZED);
        accumulate(by_category.entry(name).or_default(), t.amount.expense())?;

        let month = by_month.entry(t.month()).or_default();
        accumulate(&mut month.income, t.amount.income())?;
        accumulate(&mut month.expense, t.amount.expense())?;
    }

    let by_category: Vec<CategoryTotal> = by_category
        .into_iter()
        .filter(|(_, total)| !total.is_zero())
        .map(|(name, total)| CategoryTotal {
            category: name.to_string(),
            total: total.into(),
        })
        .collect();

    let by_month: Vec<MonthTotals> = by_month
        .into_iter()
        .map(|(month, sums)| MonthTotals {
            month,
            total_income: sums.income.into(),
            total_expense: sums.expense.into(),
        })
        .collect();

    let latest_month = by_month
        .last()
        .map(|m| LatestMonthTotals {
            total_income: m.total_income,
            total_expense: m.total_expense,
            month: Some(m.month),
        })
        .unwrap_or_default();

    Ok(Aggregate {
        by_category,
        by_month,
        latest_month,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{CategoryId, CategoryRef};
    use chrono::NaiveDate;
    use std::str::FromStr;

    pub(crate) fn txn(date: &str, amount: &str, category: Option<(CategoryId, &str)>) -> Transaction {
        Transaction {
            id: 0,
            account_id: 1,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: String::new(),
            amount: Amount::from_str(amount).unwrap(),
            category: category.map(|(id, name)| CategoryRef {
                id,
                name: name.to_string(),
            }),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    pub(crate) fn march() -> Vec<Transaction> {
        vec![
            txn("2025-03-01", "5000.00", None),
            txn("2025-03-02", "-1200.00", Some((1, "Rent"))),
            txn("2025-03-05", "-800.00", Some((2, "Groceries"))),
            txn("2025-03-09", "-300.00", Some((3, "Utilities"))),
        ]
    }

    #[test]
    fn test_single_month() {
        let agg = aggregate(&march()).unwrap();
        let march = YearMonth::new(2025, 3).unwrap();
        assert_eq!(agg.latest_month.month, Some(march));
        assert_eq!(agg.latest_month.total_income.value(), dec("5000.00"));
        assert_eq!(agg.latest_month.total_expense.value(), dec("2300.00"));
        assert_eq!(agg.by_month.len(), 1);
        // Income has no expense magnitude, so the uncategorized income does not create a bucket.
        let names: Vec<_> = agg.by_category.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Rent", "Utilities"]);
    }

    #[test]
    fn test_months_are_chronological_and_latest_is_last() {
        let transactions = vec![
            txn("2025-02-10", "-10.00", None),
            txn("2024-12-31", "100.00", None),
            txn("2025-01-15", "-5.25", None),
            txn("2025-02-11", "20.00", None),
        ];
        let agg = aggregate(&transactions).unwrap();
        let months: Vec<String> = agg.by_month.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(months, vec!["2024-12", "2025-01", "2025-02"]);
        assert_eq!(agg.latest_month.month.unwrap().to_string(), "2025-02");
        assert_eq!(agg.latest_month.total_income.value(), dec("20.00"));
        assert_eq!(agg.latest_month.total_expense.value(), dec("10.00"));
    }

    #[test]
    fn test_uncategorized_bucket() {
        let transactions = vec![
            txn("2025-03-01", "-45.20", None),
            txn("2025-03-02", "-4.80", None),
            txn("2025-03-03", "-10.00", Some((1, "Coffee"))),
        ];
        let agg = aggregate(&transactions).unwrap();
        let uncategorized = agg
            .by_category
            .iter()
            .find(|c| c.category == UNCATEGORIZED)
            .unwrap();
        assert_eq!(uncategorized.total.value(), dec("50.00"));
    }

    #[test]
    fn test_zero_totals_are_omitted() {
        let transactions = vec![
            txn("2025-03-01", "25.00", Some((1, "Refunds"))),
            txn("2025-03-02", "-0.00", Some((2, "Nothing"))),
        ];
        let agg = aggregate(&transactions).unwrap();
        assert!(agg.by_category.is_empty());
    }

    #[test]
    fn test_conservation() {
        let mut transactions = march();
        transactions.push(txn("2025-04-01", "-19.99", None));
        transactions.push(txn("2025-04-02", "-0.01", Some((2, "Groceries"))));
        transactions.push(txn("2025-04-03", "12.00", Some((1, "Rent"))));

        let agg = aggregate(&transactions).unwrap();
        let by_category: Decimal = agg.by_category.iter().map(|c| c.total.value()).sum();
        let expenses: Decimal = transactions.iter().map(|t| t.amount.expense()).sum();
        let by_month: Decimal = agg.by_month.iter().map(|m| m.total_expense.value()).sum();
        assert_eq!(by_category, expenses);
        assert_eq!(by_month, expenses);
        assert_eq!(expenses, dec("2320.00"));
    }

    #[test]
    fn test_empty() {
        let agg = aggregate(&Vec::<Transaction>::new()).unwrap();
        assert!(agg.by_category.is_empty());
        assert!(agg.by_month.is_empty());
        assert_eq!(agg.latest_month, LatestMonthTotals::default());
        assert!(agg.latest_month.total_income.is_zero());
    }

    #[test]
    fn test_overflow_is_a_validation_error() {
        let max = "-79228162514264337593543950335";
        let transactions = vec![
            txn("2025-03-01", max, None),
            txn("2025-03-02", max, None),
        ];
        let e = aggregate(&transactions).unwrap_err();
        let p = crate::error::find_pub_error(&e).unwrap();
        assert_eq!(p.error_type(), crate::error::ErrorType::Validation);

        // A single maximal amount still aggregates.
        let agg = aggregate(&transactions[..1]).unwrap();
        assert_eq!(agg.by_category[0].total.value(), Decimal::MAX);
    }
}
