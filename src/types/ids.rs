//! Identifier types
//!
//! All identifiers are hashes. Distinct newtypes keep a coin output ID from
//! being used where a transaction ID is expected. Each one prints and parses
//! as 64 lower-case hex characters and encodes as its raw 32 bytes.

use serde::{Deserialize, Serialize};

use crate::crypto::Hash;

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Hash);

        impl $name {
            pub fn as_hash(&self) -> &Hash {
                &self.0
            }
        }

        impl From<Hash> for $name {
            fn from(hash: Hash) -> Self {
                $name(hash)
            }
        }

        impl From<$name> for Hash {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = super::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Hash::from_hex(s).map($name)
            }
        }
    };
}

hash_id!(
    /// Identifies a transaction
    TransactionId
);
hash_id!(
    /// Identifies a coin output, derived from its transaction and index
    CoinOutputId
);
hash_id!(
    /// Identifies a blockstake output, derived from its transaction and index
    BlockStakeOutputId
);
hash_id!(
    /// Identifies an output of either kind
    OutputId
);

impl From<CoinOutputId> for OutputId {
    fn from(id: CoinOutputId) -> Self {
        OutputId(id.0)
    }
}

impl From<BlockStakeOutputId> for OutputId {
    fn from(id: BlockStakeOutputId) -> Self {
        OutputId(id.0)
    }
}
