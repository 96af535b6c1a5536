//! Hash-domain specifiers
//!
//! A specifier is prepended to the data of an object before hashing it, so
//! that objects of different kinds can never produce the same identifier.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::ParseError;

/// Length of a specifier in bytes
pub const SPECIFIER_LEN: usize = 16;

/// Fixed-length, zero-padded ASCII tag
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Specifier([u8; SPECIFIER_LEN]);

pub const SPECIFIER_MINER_PAYOUT: Specifier = Specifier::from_prefix(b"miner payout");
pub const SPECIFIER_COIN_INPUT: Specifier = Specifier::from_prefix(b"coin input");
pub const SPECIFIER_COIN_OUTPUT: Specifier = Specifier::from_prefix(b"coin output");
pub const SPECIFIER_BLOCKSTAKE_INPUT: Specifier = Specifier::from_prefix(b"blstake input");
pub const SPECIFIER_BLOCKSTAKE_OUTPUT: Specifier = Specifier::from_prefix(b"blstake output");
pub const SPECIFIER_MINER_FEE: Specifier = Specifier::from_prefix(b"miner fee");

impl Specifier {
    /// Build a specifier from a byte prefix, zero-padding the rest.
    ///
    /// Panics at compile time when used in a const with a prefix longer
    /// than [`SPECIFIER_LEN`].
    pub const fn from_prefix(prefix: &[u8]) -> Self {
        assert!(prefix.len() <= SPECIFIER_LEN, "specifier prefix too long");
        let mut buf = [0u8; SPECIFIER_LEN];
        let mut i = 0;
        while i < prefix.len() {
            buf[i] = prefix[i];
            i += 1;
        }
        Specifier(buf)
    }

    /// Load a specifier from its string form.
    pub fn load_string(s: &str) -> Result<Self, ParseError> {
        if s.len() > SPECIFIER_LEN {
            return Err(ParseError::SpecifierTooLong(s.len()));
        }
        let mut buf = [0u8; SPECIFIER_LEN];
        buf[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Specifier(buf))
    }

    pub fn as_bytes(&self) -> &[u8; SPECIFIER_LEN] {
        &self.0
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(SPECIFIER_LEN);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specifier({:?})", self.to_string())
    }
}

impl FromStr for Specifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specifier::load_string(s)
    }
}

impl Serialize for Specifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Specifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Specifier::load_string(&s).map_err(de::Error::custom)
        } else {
            <[u8; SPECIFIER_LEN]>::deserialize(deserializer).map(Specifier)
        }
    }
}
