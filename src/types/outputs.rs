//! Coin and blockstake inputs and outputs
//!
//! Both assets follow the same UTXO shape: an output locks a value to an
//! unlock hash, an input references a previous output by ID and carries the
//! unlocker that proves the right to spend it.

use serde::{Deserialize, Serialize};

use super::{BlockStakeOutputId, CoinOutputId, Currency, InputLockProxy, UnlockHash};

/// Spends a coin output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInput {
    #[serde(rename = "parentid")]
    pub parent_id: CoinOutputId,
    pub unlocker: InputLockProxy,
}

/// Coins locked to an unlock hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinOutput {
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
}

/// Spends a blockstake output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStakeInput {
    #[serde(rename = "parentid")]
    pub parent_id: BlockStakeOutputId,
    pub unlocker: InputLockProxy,
}

/// Blockstakes locked to an unlock hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStakeOutput {
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{hash_bytes, Hash, PublicKey};
    use crate::encoding;
    use crate::types::UnlockType;

    #[test]
    fn test_coin_output_json_field_names() {
        let output = CoinOutput {
            value: Currency::new(42),
            unlock_hash: UnlockHash::new(UnlockType::SINGLE_SIGNATURE, hash_bytes(b"owner")),
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["value"], "42");
        assert_eq!(value["unlockhash"], output.unlock_hash.to_string());
    }

    #[test]
    fn test_coin_output_binary_layout() {
        let output = CoinOutput {
            value: Currency::new(10),
            unlock_hash: UnlockHash::new(UnlockType::SINGLE_SIGNATURE, Hash::zero()),
        };
        let bytes = encoding::marshal(&output).unwrap();
        // (len + 1 value byte) + (type + hash)
        assert_eq!(bytes.len(), 8 + 1 + 1 + 32);
        assert_eq!(bytes[8], 10);
    }

    #[test]
    fn test_blockstake_input_roundtrip() {
        let input = BlockStakeInput {
            parent_id: BlockStakeOutputId(hash_bytes(b"parent")),
            unlocker: InputLockProxy::single_signature(PublicKey([3u8; 32])),
        };
        let bytes = encoding::marshal(&input).unwrap();
        let back: BlockStakeInput = encoding::unmarshal(&bytes).unwrap();
        assert_eq!(back, input);

        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"parentid\""));
        let back: BlockStakeInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }
}
