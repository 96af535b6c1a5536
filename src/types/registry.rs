//! Transaction version registry
//!
//! Maps each non-legacy transaction version to the decoder able to read it.
//! The table is assembled with a [`RegistryBuilder`] during startup, frozen
//! into a [`TransactionRegistry`] and installed once for the whole process.
//! After installation it is only ever read.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;

use super::extension::UnknownVersionDecoder;
use super::{TransactionDecoder, TransactionVersion};

static INSTALLED: OnceCell<TransactionRegistry> = OnceCell::new();
static EMPTY: TransactionRegistry = TransactionRegistry {
    decoders: BTreeMap::new(),
};
static UNKNOWN: UnknownVersionDecoder = UnknownVersionDecoder;

/// Registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("transaction version {0} is reserved for legacy transactions")]
    ReservedVersion(TransactionVersion),
    #[error("transaction version {0} is already registered")]
    DuplicateVersion(TransactionVersion),
    #[error("a transaction registry is already installed")]
    AlreadyInstalled,
}

/// Collects decoders before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    decoders: BTreeMap<TransactionVersion, Arc<dyn TransactionDecoder>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the decoder for a version.
    ///
    /// Version 0 is the built-in legacy format and cannot be overridden.
    pub fn register(
        mut self,
        version: TransactionVersion,
        decoder: Arc<dyn TransactionDecoder>,
    ) -> Result<Self, RegistryError> {
        if version.is_legacy() {
            return Err(RegistryError::ReservedVersion(version));
        }
        if self.decoders.contains_key(&version) {
            return Err(RegistryError::DuplicateVersion(version));
        }
        self.decoders.insert(version, decoder);
        Ok(self)
    }

    pub fn build(self) -> TransactionRegistry {
        TransactionRegistry {
            decoders: self.decoders,
        }
    }
}

/// Frozen version → decoder table
pub struct TransactionRegistry {
    decoders: BTreeMap<TransactionVersion, Arc<dyn TransactionDecoder>>,
}

impl TransactionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Install this registry for the whole process.
    ///
    /// Only the first call succeeds.
    pub fn install(self) -> Result<(), RegistryError> {
        let versions: Vec<u8> = self.decoders.keys().map(|v| v.0).collect();
        INSTALLED
            .set(self)
            .map_err(|_| RegistryError::AlreadyInstalled)?;
        tracing::info!(?versions, "transaction registry installed");
        Ok(())
    }

    /// The installed registry, or an empty one if none was installed yet.
    pub fn global() -> &'static TransactionRegistry {
        INSTALLED.get().unwrap_or(&EMPTY)
    }

    /// Decoder for a version; versions without one get a decoder that
    /// rejects every payload.
    pub fn decoder(&self, version: TransactionVersion) -> &dyn TransactionDecoder {
        match self.decoders.get(&version) {
            Some(decoder) => decoder.as_ref(),
            None => &UNKNOWN,
        }
    }

    pub fn is_registered(&self, version: TransactionVersion) -> bool {
        self.decoders.contains_key(&version)
    }

    pub fn versions(&self) -> impl Iterator<Item = TransactionVersion> + '_ {
        self.decoders.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for TransactionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionRegistry")
            .field("versions", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Transaction, TransactionError};

    struct NoopDecoder;

    impl TransactionDecoder for NoopDecoder {
        fn decode_transaction_data(
            &self,
            version: TransactionVersion,
            _data: &[u8],
        ) -> Result<Transaction, TransactionError> {
            Ok(Transaction {
                version,
                ..Transaction::default()
            })
        }

        fn json_decode_transaction_data(
            &self,
            version: TransactionVersion,
            _data: serde_json::Value,
        ) -> Result<Transaction, TransactionError> {
            Ok(Transaction {
                version,
                ..Transaction::default()
            })
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TransactionRegistry::builder()
            .register(TransactionVersion(3), Arc::new(NoopDecoder))
            .unwrap()
            .build();
        assert!(registry.is_registered(TransactionVersion(3)));
        assert!(!registry.is_registered(TransactionVersion(4)));
        assert_eq!(registry.len(), 1);

        let tx = registry
            .decoder(TransactionVersion(3))
            .decode_transaction_data(TransactionVersion(3), &[])
            .unwrap();
        assert_eq!(tx.version, TransactionVersion(3));
    }

    #[test]
    fn test_unregistered_version_uses_rejecting_decoder() {
        let registry = TransactionRegistry::builder().build();
        let result = registry
            .decoder(TransactionVersion(9))
            .decode_transaction_data(TransactionVersion(9), &[]);
        assert!(matches!(result, Err(TransactionError::UnknownVersion(_))));
    }

    #[test]
    fn test_legacy_version_is_reserved() {
        let result = TransactionRegistry::builder()
            .register(TransactionVersion::LEGACY, Arc::new(NoopDecoder));
        assert!(matches!(result, Err(RegistryError::ReservedVersion(_))));
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let result = TransactionRegistry::builder()
            .register(TransactionVersion(1), Arc::new(NoopDecoder))
            .unwrap()
            .register(TransactionVersion(1), Arc::new(NoopDecoder));
        assert!(matches!(result, Err(RegistryError::DuplicateVersion(_))));
    }
}
