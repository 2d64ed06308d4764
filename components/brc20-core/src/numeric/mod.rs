use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Widest decimal scale BRC-20 tolerates on a token's amounts.
pub const MAX_DECIMAL_WIDTH: u8 = 18;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum NumericError {
    #[error("'{0}' is not a valid non-negative decimal")]
    InvalidDecimal(String),
    #[error("decimal underflow: {minuend} - {subtrahend}")]
    Underflow {
        minuend: String,
        subtrahend: String,
    },
}

/// Exact, arbitrary-precision, always non-negative decimal amount.
///
/// Every BRC-20 quantity (max supply, limit, mint amount, transfer amount, balance) is
/// represented by this type; binary floating point never enters the ledger.
#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Clone, Hash)]
pub struct Decimal(BigDecimal);

impl Decimal {
    pub fn zero() -> Self {
        Decimal(BigDecimal::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: &Decimal) -> Decimal {
        Decimal(self.0.clone() + &other.0)
    }

    pub fn checked_sub(&self, other: &Decimal) -> Result<Decimal, NumericError> {
        if self.0 < other.0 {
            return Err(NumericError::Underflow {
                minuend: self.to_string(),
                subtrahend: other.to_string(),
            });
        }
        Ok(Decimal(self.0.clone() - &other.0))
    }

    pub fn min(&self, other: &Decimal) -> Decimal {
        if self.0 <= other.0 {
            self.clone()
        } else {
            other.clone()
        }
    }

    /// Number of fractional digits actually carried by this value.
    pub fn scale(&self) -> u32 {
        let (_, scale) = self.0.as_bigint_and_exponent();
        scale.max(0) as u32
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(BigDecimal::from(value))
    }
}

impl FromStr for Decimal {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty()
            || s.starts_with('.')
            || s.ends_with('.')
            || s.starts_with('+')
            || s.starts_with('-')
            || s.find(['e', 'E', '+', '-']).is_some()
            || !s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        {
            return Err(NumericError::InvalidDecimal(s.to_string()));
        }
        let value =
            BigDecimal::from_str(s).map_err(|_| NumericError::InvalidDecimal(s.to_string()))?;
        let (_, scale) = value.as_bigint_and_exponent();
        if scale > MAX_DECIMAL_WIDTH as i64 {
            return Err(NumericError::InvalidDecimal(s.to_string()));
        }
        Ok(Decimal(value))
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decimal::from_str(&s).map_err(serde::de::Error::custom)
    }
}
