//! Default transaction validation
//!
//! Pure checks applied to legacy transactions, and to any transaction whose
//! extension brings no validator of its own. Checks that need chain state
//! (parent outputs, input/output balance) belong to consensus.

use std::collections::HashSet;

use thiserror::Error;

use crate::encoding::EncodingError;
use crate::types::{BlockHeight, Currency, Transaction, UnlockError};

/// Chain parameters a transaction is validated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionValidationContext {
    /// Height of the block the transaction would be included in
    pub block_height: BlockHeight,
    pub block_size_limit: u64,
    pub arbitrary_data_size_limit: u64,
    pub minimum_miner_fee: Currency,
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Transaction is {size} bytes, exceeding the block size limit of {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("Arbitrary data is {size} bytes, exceeding the limit of {limit}")]
    ArbitraryDataTooLarge { size: u64, limit: u64 },
    #[error("Miner fee {fee} is below the minimum of {minimum}")]
    InsufficientMinerFee { fee: Currency, minimum: Currency },
    #[error("Coin output {0} has zero value")]
    ZeroCoinOutput(usize),
    #[error("Blockstake output {0} has zero value")]
    ZeroBlockStakeOutput(usize),
    #[error("Double spend detected")]
    DoubleSpend,
    #[error("Non-standard unlocker at input {index}: {source}")]
    NonStandardUnlocker {
        index: usize,
        #[source]
        source: UnlockError,
    },
    #[error("Cannot encode transaction: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
}

/// Validate size limits, fees, output values, double spends and unlockers.
pub fn default_transaction_validation(
    ctx: &TransactionValidationContext,
    tx: &Transaction,
) -> Result<(), ValidationError> {
    validate_size(ctx, tx)?;
    validate_miner_fees(ctx, tx)?;
    validate_outputs(tx)?;
    validate_no_double_spend(tx)?;
    validate_unlockers(tx)
}

fn validate_size(ctx: &TransactionValidationContext, tx: &Transaction) -> Result<(), ValidationError> {
    let size = tx.to_bytes()?.len() as u64;
    if size > ctx.block_size_limit {
        return Err(ValidationError::TooLarge {
            size,
            limit: ctx.block_size_limit,
        });
    }
    let data_size = tx.arbitrary_data.len() as u64;
    if data_size > ctx.arbitrary_data_size_limit {
        return Err(ValidationError::ArbitraryDataTooLarge {
            size: data_size,
            limit: ctx.arbitrary_data_size_limit,
        });
    }
    Ok(())
}

fn validate_miner_fees(
    ctx: &TransactionValidationContext,
    tx: &Transaction,
) -> Result<(), ValidationError> {
    match tx.miner_fees.iter().find(|fee| **fee < ctx.minimum_miner_fee) {
        Some(fee) => Err(ValidationError::InsufficientMinerFee {
            fee: fee.clone(),
            minimum: ctx.minimum_miner_fee.clone(),
        }),
        None => Ok(()),
    }
}

fn validate_outputs(tx: &Transaction) -> Result<(), ValidationError> {
    if let Some(index) = tx.coin_outputs.iter().position(|o| o.value.is_zero()) {
        return Err(ValidationError::ZeroCoinOutput(index));
    }
    if let Some(index) = tx.block_stake_outputs.iter().position(|o| o.value.is_zero()) {
        return Err(ValidationError::ZeroBlockStakeOutput(index));
    }
    Ok(())
}

fn validate_no_double_spend(tx: &Transaction) -> Result<(), ValidationError> {
    let mut coins = HashSet::with_capacity(tx.coin_inputs.len());
    if !tx.coin_inputs.iter().all(|input| coins.insert(input.parent_id)) {
        return Err(ValidationError::DoubleSpend);
    }
    let mut stakes = HashSet::with_capacity(tx.block_stake_inputs.len());
    if !tx.block_stake_inputs.iter().all(|input| stakes.insert(input.parent_id)) {
        return Err(ValidationError::DoubleSpend);
    }
    Ok(())
}

fn validate_unlockers(tx: &Transaction) -> Result<(), ValidationError> {
    let unlockers = tx
        .coin_inputs
        .iter()
        .map(|input| &input.unlocker)
        .chain(tx.block_stake_inputs.iter().map(|input| &input.unlocker));
    for (index, unlocker) in unlockers.enumerate() {
        unlocker
            .is_standard()
            .map_err(|source| ValidationError::NonStandardUnlocker { index, source })?;
    }
    Ok(())
}
