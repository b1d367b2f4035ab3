//! Amount type for handling monetary values, and the `Currency` they are denominated in.
//!
//! Amounts are stored as `Decimal` and written to JSON as plain numbers. When parsing user input,
//! a leading currency symbol and thousands separators are tolerated, e.g. `₵1,200.50`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The currencies a budget may be denominated in. No conversion happens between them.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ghs,
    Usd,
    Eur,
}

serde_plain::derive_display_from_serialize!(Currency);
serde_plain::derive_fromstr_from_deserialize!(Currency);

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Ghs => "₵",
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }
}

const SYMBOLS: [&str; 3] = ["₵", "$", "€"];

/// Represents a monetary amount.
///
/// Equality is numeric, so `450` and `450.00` are the same amount.
///
/// ```
/// # use budgettrackr_sync::model::{Amount, Currency};
/// # use std::str::FromStr;
/// let amount = Amount::from_str("₵1,200.5").unwrap();
/// assert_eq!(amount.format_money(Currency::Ghs), "₵1,200.50");
/// assert_eq!(amount, Amount::from_str("1200.50").unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Formats the amount with the currency symbol, thousands separators and two decimals.
    pub fn format_money(&self, currency: Currency) -> String {
        format!("{}{}", currency.symbol(), self)
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
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(after_minus) => (true, after_minus),
            None => (false, trimmed),
        };
        let without_symbol = SYMBOLS
            .iter()
            .find_map(|sym| rest.strip_prefix(*sym))
            .unwrap_or(rest);
        let digits = without_symbol.replace(',', "");
        let value = Decimal::from_str(&digits)
            .or_else(|_| Decimal::from_scientific(&digits))
            .map_err(AmountError)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let num = self.0.to_f64().unwrap_or_default();
        if num < 0.0 {
            write!(f, "-{}", format_num::format_num!(",.2", -num))
        } else {
            write!(f, "{}", format_num::format_num!(",.2", num))
        }
    }
}

/// Written as a JSON number when an `f64` carries the exact value, otherwise as a decimal string
/// so that no digits are lost.
impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0.to_f64() {
            Some(f) if Decimal::from_str(&f.to_string()).ok() == Some(self.0) => {
                serializer.serialize_f64(f)
            }
            _ => serializer.serialize_str(&self.0.normalize().to_string()),
        }
    }
}

/// Amounts arrive as JSON numbers from the browser-era documents and the remote service, but
/// hand-edited files sometimes quote them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s,
        };
        Amount::from_str(&text).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
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
    fn test_parse_plain() {
        let amount = Amount::from_str("50.00").unwrap();
        assert_eq!(amount.value(), dec("50"));
    }

    #[test]
    fn test_parse_with_symbol_and_commas() {
        assert_eq!(Amount::from_str("₵1,200.50").unwrap().value(), dec("1200.5"));
        assert_eq!(Amount::from_str("$1,234,567.89").unwrap().value(), dec("1234567.89"));
        assert_eq!(Amount::from_str(" €7 ").unwrap().value(), dec("7"));
    }

    #[test]
    fn test_parse_negative() {
        let amount = Amount::from_str("-$50.00").unwrap();
        assert_eq!(amount.value(), dec("-50"));
        assert!(!amount.is_positive());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("fifty").is_err());
        assert!(Amount::from_str("").is_err());
    }

    #[test]
    fn test_zero_is_not_positive() {
        assert!(!Amount::from_str("0").unwrap().is_positive());
        assert!(Amount::from_str("0.01").unwrap().is_positive());
    }

    #[test]
    fn test_format_money() {
        let amount = Amount::from_str("1200").unwrap();
        assert_eq!(amount.format_money(Currency::Ghs), "₵1,200.00");
        assert_eq!(amount.format_money(Currency::Usd), "$1,200.00");
        assert_eq!(amount.format_money(Currency::Eur), "€1,200.00");
    }

    #[test]
    fn test_serialize_as_number() {
        let amount = Amount::from_str("450.5").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "450.5");
    }

    #[test]
    fn test_serialize_keeps_every_digit() {
        let amount = Amount::from_str("1234567890123.4567").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1234567890123.4567\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value().to_string(), "1234567890123.4567");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Amount = serde_json::from_str("450.0").unwrap();
        let b: Amount = serde_json::from_str("\"450\"").unwrap();
        let c: Amount = serde_json::from_str("450").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_currency_strings() {
        assert_eq!(Currency::Ghs.to_string(), "GHS");
        assert_eq!(Currency::from_str("EUR").unwrap(), Currency::Eur);
        assert!(Currency::from_str("JPY").is_err());
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
    }
}
