//! Amount type for handling monetary values with optional dollar signs.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a dollar sign and commas. A positive amount is income, a negative amount
//! is an expense whose magnitude is reported as a positive "expense" value.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a signed dollar amount.
///
/// All arithmetic is done on the wrapped `Decimal`, never on binary floats. Serialization writes
/// a JSON number, which is what the reporting UI consumes.
///
/// # Examples
///
/// ```
/// # use expense_engine::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-$1,200.00").unwrap();
/// assert!(amount.is_expense());
/// assert_eq!(amount.expense().to_string(), "1200.00");
/// assert_eq!(amount.to_string(), "-1200.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Positive amounts are income.
    pub fn is_income(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Negative amounts are expenses.
    pub fn is_expense(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// The income part of this amount: the value itself if positive, otherwise zero.
    pub fn income(&self) -> Decimal {
        if self.is_income() {
            self.0
        } else {
            Decimal::ZERO
        }
    }

    /// The expense magnitude of this amount: the absolute value if negative, otherwise zero.
    pub fn expense(&self) -> Decimal {
        if self.is_expense() {
            self.0.abs()
        } else {
            Decimal::ZERO
        }
    }

    /// Formats the amount for humans with a dollar sign and thousands separators, e.g.
    /// `-$60,000.00`.
    pub fn pretty(&self) -> String {
        let sign = if self.is_expense() { "-" } else { "" };
        format!(
            "{sign}${}",
            format_num::format_num!(",.2", self.0.abs().to_f64().unwrap_or_default())
        )
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            match after_minus.strip_prefix('$') {
                Some(after_dollar) => format!("-{after_dollar}"),
                None => trimmed.to_string(),
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        let without_commas = without_dollar.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

/// Amounts arrive either as JSON numbers or as strings such as `"-$45.20"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(f64),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(s) => Amount::from_str(&s).map_err(serde::de::Error::custom),
            RawAmount::Number(n) => Decimal::from_f64(n)
                .map(Amount)
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid amount {n}"))),
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(Amount::from_str("$50.00").unwrap().value(), dec("50.00"));
        assert_eq!(Amount::from_str("-$50.00").unwrap().value(), dec("-50.00"));
        assert_eq!(Amount::from_str("-50.00").unwrap().value(), dec("-50.00"));
        assert_eq!(
            Amount::from_str("  $1,234,567.89  ").unwrap().value(),
            dec("1234567.89")
        );
        assert_eq!(Amount::from_str("").unwrap().value(), Decimal::ZERO);
        assert!(Amount::from_str("fifty").is_err());
    }

    #[test]
    fn test_income_and_expense_parts() {
        let income = Amount::from_str("5000.00").unwrap();
        assert!(income.is_income());
        assert_eq!(income.income(), dec("5000.00"));
        assert_eq!(income.expense(), Decimal::ZERO);

        let expense = Amount::from_str("-45.20").unwrap();
        assert!(expense.is_expense());
        assert_eq!(expense.income(), Decimal::ZERO);
        assert_eq!(expense.expense(), dec("45.20"));
    }

    #[test]
    fn test_zero_is_neither() {
        let zero = Amount::from_str("$0.00").unwrap();
        assert!(zero.is_zero());
        assert!(!zero.is_income());
        assert!(!zero.is_expense());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(dec("-45.2")).to_string(), "-45.20");
        assert_eq!(Amount::new(dec("5000")).to_string(), "5000.00");
    }

    #[test]
    fn test_pretty() {
        assert_eq!(Amount::new(dec("-60000")).pretty(), "-$60,000.00");
        assert_eq!(Amount::new(dec("12.5")).pretty(), "$12.50");
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&Amount::new(dec("1200.00"))).unwrap();
        assert_eq!(json, "1200.0");
    }

    #[test]
    fn test_deserialize_string_or_number() {
        let a: Amount = serde_json::from_str("\"-$45.20\"").unwrap();
        assert_eq!(a.value(), dec("-45.20"));
        let b: Amount = serde_json::from_str("-45.2").unwrap();
        assert_eq!(b.value(), dec("-45.2"));
    }

    #[test]
    fn test_exact_accumulation() {
        // 0.1 + 0.2 drifts in binary floating point but not here.
        let sum = Amount::from_str("0.1").unwrap().value() + Amount::from_str("0.2").unwrap().value();
        assert_eq!(sum, dec("0.3"));
    }
}
