use crate::error::{LedgerError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Platform-wide number of decimal places for every stored monetary value.
pub const MONEY_SCALE: u32 = 2;

/// Largest single movement the platform accepts.
pub const MAX_AMOUNT: Decimal = dec!(999999999999.99);

fn at_scale(mut value: Decimal) -> Decimal {
    value.rescale(MONEY_SCALE);
    value
}

/// Rounds to the platform scale, half to even.
pub fn round_money(value: Decimal) -> Decimal {
    at_scale(value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven))
}

/// A monetary value at the platform scale.
///
/// Wallet balances are `Balance`s. The type itself allows negative values so that
/// arithmetic can be checked afterwards; the wallet rejects any state where one
/// is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(at_scale(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Addition that reports overflow instead of panicking.
    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| overflow("+", self, rhs))
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or_else(|| overflow("-", self, rhs))
    }
}

fn overflow(op: &str, lhs: Balance, rhs: Balance) -> LedgerError {
    LedgerError::Validation {
        message: format!("balance overflow computing {lhs} {op} {rhs}"),
        fields: vec!["amount"],
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self::new)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Balance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, b| acc + b)
    }
}

/// A strictly positive monetary amount with at most `MONEY_SCALE` decimals.
///
/// Every credit, debit, reservation and payout is expressed as an `Amount`, so a
/// zero or negative movement cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::Validation {
                message: format!("amount must be greater than zero, got {value}"),
                fields: vec!["amount"],
            });
        }
        if value > MAX_AMOUNT {
            return Err(LedgerError::Validation {
                message: format!("amount {value} exceeds the maximum of {MAX_AMOUNT}"),
                fields: vec!["amount"],
            });
        }
        if value.round_dp(MONEY_SCALE) != value {
            return Err(LedgerError::Validation {
                message: format!("amount {value} has more than {MONEY_SCALE} decimal places"),
                fields: vec!["amount"],
            });
        }
        Ok(Self(at_scale(value)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(5.25));
        assert_eq!(b1 + b2, Balance::new(dec!(15.25)));
        assert_eq!(b1 - b2, Balance::new(dec!(4.75)));
        assert!((b2 - b1).is_negative());
        assert!(!Balance::ZERO.is_negative());
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(Amount::new(dec!(1.500)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            Amount::new(dec!(1.005)),
            Err(LedgerError::Validation { fields, .. }) if fields == vec!["amount"]
        ));
    }

    #[test]
    fn test_amount_above_platform_maximum() {
        assert!(Amount::new(MAX_AMOUNT).is_ok());
        assert!(matches!(
            Amount::new(dec!(50000000000000000000000000000)),
            Err(LedgerError::Validation { fields, .. }) if fields == vec!["amount"]
        ));
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Balance(Decimal::MAX);
        let one = Balance::new(dec!(1));
        assert!(matches!(
            huge.checked_add(huge),
            Err(LedgerError::Validation { .. })
        ));
        assert!(Balance(Decimal::MIN).checked_sub(huge).is_err());
        assert_eq!(one.checked_add(one).unwrap(), Balance::new(dec!(2)));
        assert_eq!(one.checked_sub(one).unwrap(), Balance::ZERO);
    }

    #[test]
    fn test_balance_deserializes_from_string_or_number() {
        let from_str: Balance = serde_json::from_str("\"1.5\"").unwrap();
        let from_num: Balance = serde_json::from_str("7").unwrap();
        assert_eq!(from_str.to_string(), "1.50");
        assert_eq!(from_num, Balance::new(dec!(7)));
    }

    #[test]
    fn test_display_uses_platform_scale() {
        assert_eq!(Balance::ZERO.to_string(), "0.00");
        assert_eq!(Amount::new(dec!(400)).unwrap().to_string(), "400.00");
        assert_eq!(Balance::new(dec!(1.5)).to_string(), "1.50");
    }

    #[test]
    fn test_round_money_half_even() {
        assert_eq!(round_money(dec!(0.125)), dec!(0.12));
        assert_eq!(round_money(dec!(0.135)), dec!(0.14));
        assert_eq!(round_money(dec!(200.0000)), dec!(200.00));
    }

    #[test]
    fn test_amount_deserialize_rejects_non_positive() {
        let ok: Amount = serde_json::from_str("\"12.30\"").unwrap();
        assert_eq!(ok.value(), dec!(12.30));
        assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"12.30\"");
    }
}
