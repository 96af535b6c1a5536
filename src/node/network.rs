//! Network selection and chain constants
//!
//! tfchain runs as three networks. They share the transaction format and
//! differ in the limits a transaction is validated against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ARBITRARY_DATA_SIZE_LIMIT, BLOCK_SIZE_LIMIT, CHAIN_NAME, COIN_PRECISION, MINIMUM_MINER_FEE,
};
use crate::types::{BlockHeight, Currency};
use crate::validation::TransactionValidationContext;

/// Protocol version announced by this implementation
pub const PROTOCOL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Standard,
    Testnet,
    Devnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Standard, Network::Testnet, Network::Devnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Standard => "standard",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        }
    }

    pub fn chain_constants(&self) -> ChainConstants {
        match self {
            Network::Standard | Network::Testnet => ChainConstants {
                network: *self,
                block_size_limit: BLOCK_SIZE_LIMIT,
                arbitrary_data_size_limit: ARBITRARY_DATA_SIZE_LIMIT,
                minimum_miner_fee: Currency::new(MINIMUM_MINER_FEE),
            },
            // any nonzero fee
            Network::Devnet => ChainConstants {
                network: *self,
                block_size_limit: BLOCK_SIZE_LIMIT,
                arbitrary_data_size_limit: ARBITRARY_DATA_SIZE_LIMIT,
                minimum_miner_fee: Currency::new(1),
            },
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|network| network.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("network name {:?} not recognized", s))
    }
}

/// Limits a network applies to transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainConstants {
    pub network: Network,
    pub block_size_limit: u64,
    pub arbitrary_data_size_limit: u64,
    pub minimum_miner_fee: Currency,
}

impl ChainConstants {
    /// Context for validating a transaction to be included at `height`.
    pub fn validation_context(&self, height: BlockHeight) -> TransactionValidationContext {
        TransactionValidationContext {
            block_height: height,
            block_size_limit: self.block_size_limit,
            arbitrary_data_size_limit: self.arbitrary_data_size_limit,
            minimum_miner_fee: self.minimum_miner_fee.clone(),
        }
    }
}

/// Chain identity reported by the tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockchainInfo {
    pub name: &'static str,
    pub network: Network,
    pub coin_precision: u64,
    pub chain_version: &'static str,
    pub protocol_version: &'static str,
}

impl BlockchainInfo {
    pub fn new(network: Network) -> Self {
        Self {
            name: CHAIN_NAME,
            network,
            coin_precision: COIN_PRECISION,
            chain_version: env!("CARGO_PKG_VERSION"),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}
