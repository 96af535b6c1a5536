//! BLAKE2b-256 hashing
//!
//! Every identifier and checksum in tfchain is a BLAKE2b digest truncated to
//! 32 bytes, taken over the canonical encoding of the hashed objects.

use std::fmt;
use std::io::{self, Write};

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::{self, EncodingError};
use crate::types::ParseError;

/// Size of a hash in bytes
pub const HASH_SIZE: usize = 32;

type Blake2b256 = Blake2b<U32>;

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub [u8; HASH_SIZE]);

impl Hash {
    /// Create a zero hash
    pub const fn zero() -> Self {
        Hash([0u8; HASH_SIZE])
    }

    /// Parse a hash from its hex representation.
    ///
    /// The string must be exactly 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        if s.len() != HASH_SIZE * 2 {
            return Err(ParseError::InvalidLength {
                expected: HASH_SIZE * 2,
                actual: s.len(),
            });
        }
        let mut arr = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Hash(arr))
    }

    /// Convert to lower-case hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::str::FromStr for Hash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Hash::from_hex(&s).map_err(de::Error::custom)
        } else {
            <[u8; HASH_SIZE]>::deserialize(deserializer).map(Hash)
        }
    }
}

/// Incremental hasher fed with raw bytes or canonically encoded objects.
#[derive(Default)]
pub struct Hasher(Blake2b256);

impl Hasher {
    pub fn new() -> Self {
        Hasher(Blake2b256::new())
    }

    /// Append raw bytes
    pub fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    /// Append the canonical encoding of a value
    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodingError> {
        encoding::marshal_into(&mut *self, value)
    }

    pub fn finalize(self) -> Hash {
        Hash(self.0.finalize().into())
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hash arbitrary bytes
pub fn hash_bytes(data: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Hash the canonical encoding of a value.
///
/// Tuples encode as the concatenation of their elements, so
/// `hash_all(&(a, b, c))` hashes `a ‖ b ‖ c`.
pub fn hash_all<T: Serialize + ?Sized>(value: &T) -> Result<Hash, EncodingError> {
    let mut hasher = Hasher::new();
    hasher.encode(value)?;
    Ok(hasher.finalize())
}
