//! Compact, ordered transaction identifiers
//!
//! A short ID packs the height of the block holding a transaction and the
//! transaction's position inside that block into one `u64`:
//!
//! ```text
//! [ block height: 50 bits | sequence index: 14 bits ]
//! ```
//!
//! Comparing two short IDs numerically therefore compares chain positions.
//! The binary form is the `u64` in little-endian byte order, which preserves
//! that ordering when read back as an integer on a little-endian host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{SHORT_ID_HEIGHT_BITS, SHORT_ID_SEQUENCE_BITS};

/// Block height
pub type BlockHeight = u64;

const SEQUENCE_MASK: u64 = (1 << SHORT_ID_SEQUENCE_BITS) - 1;
const HEIGHT_LIMIT: u64 = 1 << SHORT_ID_HEIGHT_BITS;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionShortId(u64);

impl TransactionShortId {
    /// Combine a block height and a sequence index.
    ///
    /// # Panics
    ///
    /// Panics if `height` needs more than 50 bits or `sequence_index` more
    /// than 14 bits. Both bounds are protocol invariants: callers validate
    /// chain height and per-block transaction counts beforehand.
    pub fn new(height: BlockHeight, sequence_index: u16) -> Self {
        assert!(
            height < HEIGHT_LIMIT,
            "block height {} out of bounds for a short transaction id",
            height
        );
        assert!(
            u64::from(sequence_index) <= SEQUENCE_MASK,
            "transaction sequence index {} out of bounds for a short transaction id",
            sequence_index
        );
        TransactionShortId((height << SHORT_ID_SEQUENCE_BITS) | u64::from(sequence_index))
    }

    /// Whether `new` would accept these components.
    pub fn fits(height: BlockHeight, sequence_index: u16) -> bool {
        height < HEIGHT_LIMIT && u64::from(sequence_index) <= SEQUENCE_MASK
    }

    pub fn from_u64(raw: u64) -> Self {
        TransactionShortId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn block_height(&self) -> BlockHeight {
        self.0 >> SHORT_ID_SEQUENCE_BITS
    }

    pub fn transaction_sequence_index(&self) -> u16 {
        (self.0 & SEQUENCE_MASK) as u16
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        TransactionShortId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for TransactionShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TransactionShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransactionShortId(height={}, seq={})",
            self.block_height(),
            self.transaction_sequence_index()
        )
    }
}

impl FromStr for TransactionShortId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(TransactionShortId)
    }
}
