//! tfchain core library
//!
//! Transaction data model of the tfchain ledger: coin and blockstake inputs
//! and outputs, versioned transactions with a canonical binary encoding and
//! a JSON envelope, hash-derived identifiers, short IDs and default
//! validation. Transaction versions other than the legacy one are handled by
//! decoders registered at startup.

pub mod crypto;
pub mod encoding;
pub mod logging;
pub mod node;
pub mod types;
pub mod validation;

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    /// Chain name
    pub const CHAIN_NAME: &str = "tfchain";

    /// Coin unit name
    pub const COIN_UNIT: &str = "TFT";

    /// Base units per coin
    pub const COIN_PRECISION: u64 = 1_000_000_000;

    /// Bits of a short transaction ID holding the block height
    pub const SHORT_ID_HEIGHT_BITS: u32 = 50;

    /// Bits of a short transaction ID holding the in-block sequence index
    pub const SHORT_ID_SEQUENCE_BITS: u32 = 14;

    /// Maximum size of an encoded block in bytes
    pub const BLOCK_SIZE_LIMIT: u64 = 2_000_000;

    /// Maximum arbitrary data carried by one transaction
    pub const ARBITRARY_DATA_SIZE_LIMIT: u64 = 83;

    /// Minimum miner fee in base units (0.1 TFT)
    pub const MINIMUM_MINER_FEE: u64 = COIN_PRECISION / 10;
}
