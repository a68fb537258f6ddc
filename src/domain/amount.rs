//! Amount type
//!
//! Domain primitives for monetary values held as integer minor units
//! (e.g. cents). Floating point never touches a balance.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum amount or balance, in minor units (10^15).
pub const MAX_AMOUNT: u64 = 1_000_000_000_000_000;

/// Maximum number of fractional digits accepted for a currency scale.
pub const MAX_SCALE: u32 = 8;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Value never exceeds [`MAX_AMOUNT`] minor units
///
/// # Example
/// ```
/// use ledger_core::domain::Amount;
///
/// let amount = Amount::new(250).unwrap();
/// assert_eq!(amount.minor_units(), 250);
/// assert!(Amount::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Amount(u64);

/// Errors that can occur when creating an Amount or Balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive")]
    NotPositive,

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Balance would become negative")]
    Underflow,

    #[error("Amount has too many decimal places (max {max}, got {got})")]
    TooManyDecimals { max: u32, got: u32 },

    #[error("Unsupported currency scale: {0}")]
    InvalidScale(u32),

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value is zero
    /// - `AmountError::Overflow` if value > [`MAX_AMOUNT`]
    pub fn new(minor_units: u64) -> Result<Self, AmountError> {
        if minor_units == 0 {
            return Err(AmountError::NotPositive);
        }
        if minor_units > MAX_AMOUNT {
            return Err(AmountError::Overflow);
        }
        Ok(Self(minor_units))
    }

    /// Convert a decimal amount expressed in major units into minor units.
    ///
    /// `scale` is the number of minor-unit digits in one major unit
    /// (2 for cents). Values carrying more fractional digits than `scale`
    /// are rejected rather than rounded.
    pub fn from_major_units(value: Decimal, scale: u32) -> Result<Self, AmountError> {
        if scale > MAX_SCALE {
            return Err(AmountError::InvalidScale(scale));
        }
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        let normalized = value.normalize();
        if normalized.scale() > scale {
            return Err(AmountError::TooManyDecimals {
                max: scale,
                got: normalized.scale(),
            });
        }

        let factor = Decimal::from(10u64.pow(scale));
        let minor = normalized
            .checked_mul(factor)
            .ok_or(AmountError::Overflow)?
            .trunc();

        let minor = minor.to_u64().ok_or(AmountError::Overflow)?;
        Self::new(minor)
    }

    /// Parse a decimal string in major units (e.g. `"12.34"` with scale 2).
    pub fn parse_major_units(s: &str, scale: u32) -> Result<Self, AmountError> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Self::from_major_units(decimal, scale)
    }

    /// Get the value in minor units.
    pub fn minor_units(&self) -> u64 {
        self.0
    }

    /// Express the amount in major units at `scale`
    pub fn to_major_units(&self, scale: u32) -> Decimal {
        minor_to_major(self.0, scale)
    }
}

/// `scale` is capped at [`MAX_SCALE`]; values never exceed [`MAX_AMOUNT`]
fn minor_to_major(minor_units: u64, scale: u32) -> Decimal {
    Decimal::new(minor_units as i64, scale.min(MAX_SCALE))
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses an integer count of minor units.
impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix('-') {
            if rest.parse::<u64>().is_ok() {
                return Err(AmountError::NotPositive);
            }
        }
        let value = trimmed
            .parse::<u64>()
            .map_err(|e| AmountError::ParseError(format!("{trimmed:?}: {e}")))?;
        Amount::new(value)
    }
}

impl TryFrom<u64> for Amount {
    type Error = AmountError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Balance represents an account balance (zero or positive).
/// Unlike Amount, Balance can be zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Balance(u64);

impl Balance {
    /// Create a new balance
    pub fn new(minor_units: u64) -> Result<Self, AmountError> {
        if minor_units > MAX_AMOUNT {
            return Err(AmountError::Overflow);
        }
        Ok(Self(minor_units))
    }

    /// Create a zero balance
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the value in minor units
    pub fn minor_units(&self) -> u64 {
        self.0
    }

    /// Express the balance in major units at `scale`
    pub fn to_major_units(&self, scale: u32) -> Decimal {
        minor_to_major(self.0, scale)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if balance covers a debit of `amount`
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 >= amount.minor_units()
    }

    /// Add amount to balance
    pub fn credit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        let new_value = self
            .0
            .checked_add(amount.minor_units())
            .ok_or(AmountError::Overflow)?;
        Balance::new(new_value)
    }

    /// Subtract amount from balance
    pub fn debit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        self.0
            .checked_sub(amount.minor_units())
            .map(Balance)
            .ok_or(AmountError::Underflow)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Balance {
    type Error = AmountError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Balance::new(value)
    }
}

impl From<Balance> for u64 {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Balance(amount.0)
    }
}
