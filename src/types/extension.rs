//! Per-version transaction behaviour
//!
//! A transaction of version > 0 is produced by the decoder registered for
//! that version. The decoder attaches an extension to the transaction; the
//! extension carries the version's typed payload and exposes the behaviour
//! that replaces the legacy rules. Each capability is optional:
//!
//! - [`TransactionDataEncoder`]: custom binary and JSON payload
//! - [`TransactionValidator`]: replaces the default validation entirely
//! - [`InputSigHasher`]: custom per-input signature hash

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::{Transaction, TransactionError, TransactionVersion};
use crate::crypto::Hash;
use crate::encoding::EncodingError;
use crate::validation::{TransactionValidationContext, ValidationError};

/// Shared handle to a transaction's extension
pub type Extension = Arc<dyn TransactionExtension>;

/// Encodes everything of a transaction except its version.
pub trait TransactionDataEncoder: Send + Sync {
    /// Binary payload, written after the version byte as one length-prefixed blob.
    fn encode_transaction_data(&self, tx: &Transaction) -> Result<Vec<u8>, EncodingError>;

    /// JSON payload, written as the `data` field of the envelope.
    fn json_encode_transaction_data(
        &self,
        tx: &Transaction,
    ) -> Result<serde_json::Value, EncodingError>;
}

/// Builds a transaction from the payload that follows its version.
pub trait TransactionDecoder: Send + Sync {
    fn decode_transaction_data(
        &self,
        version: TransactionVersion,
        data: &[u8],
    ) -> Result<Transaction, TransactionError>;

    fn json_decode_transaction_data(
        &self,
        version: TransactionVersion,
        data: serde_json::Value,
    ) -> Result<Transaction, TransactionError>;
}

/// Validation rules owned by a transaction version.
pub trait TransactionValidator: Send + Sync {
    fn validate_transaction(
        &self,
        ctx: &TransactionValidationContext,
        tx: &Transaction,
    ) -> Result<(), ValidationError>;
}

/// Signature hash for a given input, used by unlockers.
pub trait InputSigHasher: Send + Sync {
    fn input_sig_hash(
        &self,
        tx: &Transaction,
        input_index: u64,
        extra: &[u8],
    ) -> Result<Hash, EncodingError>;
}

/// Version-specific payload attached to a transaction.
pub trait TransactionExtension: fmt::Debug + Send + Sync + 'static {
    fn encoder(&self) -> Option<&dyn TransactionDataEncoder> {
        None
    }

    fn validator(&self) -> Option<&dyn TransactionValidator> {
        None
    }

    fn sig_hasher(&self) -> Option<&dyn InputSigHasher> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another extension.
    fn dyn_eq(&self, other: &dyn TransactionExtension) -> bool;
}

/// Implements `as_any` and `dyn_eq` for an extension type that is `PartialEq`.
#[macro_export]
macro_rules! impl_extension_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn dyn_eq(&self, other: &dyn $crate::types::TransactionExtension) -> bool {
            other
                .as_any()
                .downcast_ref::<Self>()
                .map_or(false, |other| self == other)
        }
    };
}

/// Decoder used for versions nobody registered: always fails.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct UnknownVersionDecoder;

impl TransactionDecoder for UnknownVersionDecoder {
    fn decode_transaction_data(
        &self,
        version: TransactionVersion,
        _data: &[u8],
    ) -> Result<Transaction, TransactionError> {
        tracing::debug!(version = version.0, "rejecting binary transaction of unknown version");
        Err(TransactionError::UnknownVersion(version))
    }

    fn json_decode_transaction_data(
        &self,
        version: TransactionVersion,
        _data: serde_json::Value,
    ) -> Result<Transaction, TransactionError> {
        tracing::debug!(version = version.0, "rejecting json transaction of unknown version");
        Err(TransactionError::UnknownVersion(version))
    }
}
