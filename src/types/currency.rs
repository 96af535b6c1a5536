//! Currency values
//!
//! Coin and blockstake amounts are non-negative integers of unbounded size,
//! expressed in the smallest unit. The binary form is the minimal big-endian
//! byte string of the value (length-prefixed, zero encodes as the empty
//! string); the JSON form is a decimal string.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::ParseError;
use crate::constants::COIN_PRECISION;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Currency(BigUint);

impl Currency {
    pub fn zero() -> Self {
        Currency(BigUint::default())
    }

    pub fn new(value: u64) -> Self {
        Currency(BigUint::from(value))
    }

    /// Amount of whole coins, scaled by [`COIN_PRECISION`].
    pub fn from_coins(coins: u64) -> Self {
        Currency(BigUint::from(coins) * COIN_PRECISION)
    }

    pub fn is_zero(&self) -> bool {
        self.0.bits() == 0
    }

    pub fn checked_sub(&self, other: &Currency) -> Option<Currency> {
        if self.0 >= other.0 {
            Some(Currency(&self.0 - &other.0))
        } else {
            None
        }
    }

    /// Minimal big-endian representation; zero is the empty byte string.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        if self.is_zero() {
            return Vec::new();
        }
        self.0.to_bytes_be()
    }

    /// Parse the minimal big-endian representation.
    ///
    /// Leading zero bytes are rejected: they would decode to a value whose
    /// re-encoding differs from the input.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.first() == Some(&0) {
            return Err(ParseError::InvalidCurrency(
                "non-canonical leading zero byte".to_string(),
            ));
        }
        Ok(Currency(BigUint::from_bytes_be(bytes)))
    }
}

impl From<u64> for Currency {
    fn from(value: u64) -> Self {
        Currency::new(value)
    }
}

impl Add for Currency {
    type Output = Currency;

    fn add(self, other: Currency) -> Currency {
        Currency(self.0 + other.0)
    }
}

impl<'a> Add<&'a Currency> for Currency {
    type Output = Currency;

    fn add(self, other: &'a Currency) -> Currency {
        Currency(self.0 + &other.0)
    }
}

impl std::iter::Sum for Currency {
    fn sum<I: Iterator<Item = Currency>>(iter: I) -> Self {
        iter.fold(Currency::zero(), Add::add)
    }
}

impl<'a> std::iter::Sum<&'a Currency> for Currency {
    fn sum<I: Iterator<Item = &'a Currency>>(iter: I) -> Self {
        iter.fold(Currency::zero(), Add::add)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.0)
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidCurrency(format!("{:?} is not a decimal number", s)));
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Currency)
            .ok_or_else(|| ParseError::InvalidCurrency(format!("{:?} is not a decimal number", s)))
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.to_be_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Currency::from_be_bytes(&bytes).map_err(de::Error::custom)
        }
    }
}
