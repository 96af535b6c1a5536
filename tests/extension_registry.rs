//! Extension and registry tests
//!
//! Registers two non-legacy versions in the process-wide registry:
//!
//! - 129: coin creation, with its own payload, encoder, validator and sig hasher
//! - 2: no extension, the legacy fields travel as one blob

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use proptest::prelude::*;
use serde::Deserialize;
use tfchain_core::crypto::{hash_all, hash_bytes, Hash, PrivateKey};
use tfchain_core::encoding::{self, EncodingError};
use tfchain_core::types::{
    CoinInput, CoinOutput, CoinOutputId, Currency, InputLockProxy, InputSigHasher, RegistryError,
    Transaction, TransactionDataEncoder, TransactionDecoder, TransactionError,
    TransactionExtension, TransactionRegistry, TransactionValidator, TransactionVersion,
    UnlockHash, UnlockType,
};
use tfchain_core::validation::{TransactionValidationContext, ValidationError};

const COIN_CREATION: TransactionVersion = TransactionVersion(129);
const BLOB: TransactionVersion = TransactionVersion(2);

static INSTALL: Once = Once::new();

fn setup() {
    INSTALL.call_once(|| {
        TransactionRegistry::builder()
            .register(COIN_CREATION, Arc::new(CoinCreationDecoder))
            .unwrap()
            .register(BLOB, Arc::new(BlobDecoder))
            .unwrap()
            .build()
            .install()
            .unwrap();
    });
}

// ============================================================================
// COIN CREATION VERSION
// ============================================================================

#[derive(Debug)]
struct CoinCreation {
    nonce: u64,
    description: String,
    validations: Arc<AtomicUsize>,
}

impl CoinCreation {
    fn new(nonce: u64, description: &str) -> Self {
        CoinCreation {
            nonce,
            description: description.to_string(),
            validations: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl PartialEq for CoinCreation {
    fn eq(&self, other: &Self) -> bool {
        self.nonce == other.nonce && self.description == other.description
    }
}

impl TransactionExtension for CoinCreation {
    fn encoder(&self) -> Option<&dyn TransactionDataEncoder> {
        Some(self)
    }

    fn validator(&self) -> Option<&dyn TransactionValidator> {
        Some(self)
    }

    fn sig_hasher(&self) -> Option<&dyn InputSigHasher> {
        Some(self)
    }

    tfchain_core::impl_extension_any!();
}

impl TransactionDataEncoder for CoinCreation {
    fn encode_transaction_data(&self, tx: &Transaction) -> Result<Vec<u8>, EncodingError> {
        encoding::marshal(&(self.nonce, &self.description, &tx.coin_outputs, &tx.miner_fees))
    }

    fn json_encode_transaction_data(
        &self,
        tx: &Transaction,
    ) -> Result<serde_json::Value, EncodingError> {
        Ok(serde_json::json!({
            "nonce": self.nonce,
            "description": self.description,
            "coinoutputs": tx.coin_outputs,
            "minerfees": tx.miner_fees,
        }))
    }
}

impl TransactionValidator for CoinCreation {
    fn validate_transaction(
        &self,
        _ctx: &TransactionValidationContext,
        _tx: &Transaction,
    ) -> Result<(), ValidationError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        if self.description.is_empty() {
            return Err(ValidationError::InvalidTransaction(
                "coin creation needs a description".to_string(),
            ));
        }
        Ok(())
    }
}

impl InputSigHasher for CoinCreation {
    fn input_sig_hash(
        &self,
        tx: &Transaction,
        input_index: u64,
        extra: &[u8],
    ) -> Result<Hash, EncodingError> {
        hash_all(&(tx.version, input_index, extra, self.nonce, &tx.coin_outputs))
    }
}

#[derive(Deserialize)]
struct JsonCoinCreation {
    nonce: u64,
    description: String,
    #[serde(rename = "coinoutputs")]
    coin_outputs: Vec<CoinOutput>,
    #[serde(rename = "minerfees")]
    miner_fees: Vec<Currency>,
}

struct CoinCreationDecoder;

impl CoinCreationDecoder {
    fn build(
        version: TransactionVersion,
        nonce: u64,
        description: String,
        coin_outputs: Vec<CoinOutput>,
        miner_fees: Vec<Currency>,
    ) -> Transaction {
        Transaction {
            version,
            coin_outputs,
            miner_fees,
            extension: Some(Arc::new(CoinCreation {
                nonce,
                description,
                validations: Arc::new(AtomicUsize::new(0)),
            })),
            ..Transaction::default()
        }
    }
}

impl TransactionDecoder for CoinCreationDecoder {
    fn decode_transaction_data(
        &self,
        version: TransactionVersion,
        data: &[u8],
    ) -> Result<Transaction, TransactionError> {
        let (nonce, description, coin_outputs, miner_fees): (u64, String, Vec<CoinOutput>, Vec<Currency>) =
            encoding::unmarshal(data)?;
        Ok(Self::build(version, nonce, description, coin_outputs, miner_fees))
    }

    fn json_decode_transaction_data(
        &self,
        version: TransactionVersion,
        data: serde_json::Value,
    ) -> Result<Transaction, TransactionError> {
        let data: JsonCoinCreation =
            serde_json::from_value(data).map_err(|e| TransactionError::InvalidData(e.to_string()))?;
        Ok(Self::build(
            version,
            data.nonce,
            data.description,
            data.coin_outputs,
            data.miner_fees,
        ))
    }
}

fn owner() -> UnlockHash {
    UnlockHash::new(UnlockType::SINGLE_SIGNATURE, hash_bytes(b"minter"))
}

fn coin_creation(nonce: u64, description: &str, values: &[u64]) -> (Transaction, Arc<CoinCreation>) {
    let extension = Arc::new(CoinCreation::new(nonce, description));
    let tx = Transaction {
        version: COIN_CREATION,
        coin_outputs: values
            .iter()
            .map(|v| CoinOutput {
                value: Currency::new(*v),
                unlock_hash: owner(),
            })
            .collect(),
        miner_fees: vec![Currency::new(1)],
        extension: Some(extension.clone()),
        ..Transaction::default()
    };
    (tx, extension)
}

fn context() -> TransactionValidationContext {
    TransactionValidationContext {
        block_height: 10,
        block_size_limit: 2_000_000,
        arbitrary_data_size_limit: 83,
        minimum_miner_fee: Currency::new(100),
    }
}

// ============================================================================
// BLOB VERSION
// ============================================================================

struct BlobDecoder;

impl TransactionDecoder for BlobDecoder {
    fn decode_transaction_data(
        &self,
        version: TransactionVersion,
        data: &[u8],
    ) -> Result<Transaction, TransactionError> {
        Ok(Transaction::decode_legacy_data(version, data)?)
    }

    fn json_decode_transaction_data(
        &self,
        version: TransactionVersion,
        data: serde_json::Value,
    ) -> Result<Transaction, TransactionError> {
        Ok(Transaction::json_decode_legacy_data(version, data)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_coin_creation_binary_roundtrip() {
    setup();
    let (tx, _) = coin_creation(7, "genesis mint", &[1000, 2000]);
    let bytes = tx.to_bytes().unwrap();
    assert_eq!(bytes[0], 129);

    let payload = encoding::unmarshal::<Vec<u8>>(&bytes[1..]).unwrap();
    assert_eq!(
        payload,
        encoding::marshal(&(7u64, "genesis mint", &tx.coin_outputs, &tx.miner_fees)).unwrap()
    );

    let decoded = Transaction::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, tx);
    assert_eq!(decoded.to_bytes().unwrap(), bytes);
    assert_eq!(decoded.id().unwrap(), tx.id().unwrap());
}

#[test]
fn test_coin_creation_json_roundtrip() {
    setup();
    let (tx, _) = coin_creation(8, "second mint", &[5]);
    let value = tx.to_json().unwrap();
    assert_eq!(value["version"], 129);
    assert_eq!(value["data"]["nonce"], 8);
    assert_eq!(value["data"]["coinoutputs"][0]["value"], "5");

    let decoded = Transaction::from_json(value).unwrap();
    assert_eq!(decoded, tx);

    let via_serde: Transaction = serde_json::from_str(&serde_json::to_string(&tx).unwrap()).unwrap();
    assert_eq!(via_serde, tx);
}

#[test]
fn test_coin_creation_id_hashes_full_encoding() {
    setup();
    let (tx, _) = coin_creation(9, "mint", &[1]);
    assert_eq!(tx.id().unwrap().0, hash_bytes(&tx.to_bytes().unwrap()));

    let (other, _) = coin_creation(10, "mint", &[1]);
    assert_ne!(tx.id().unwrap(), other.id().unwrap());
    assert_ne!(tx.coin_output_id(0).unwrap(), other.coin_output_id(0).unwrap());
    assert_ne!(tx.coin_output_id(0).unwrap().0, tx.block_stake_output_id(0).unwrap().0);
}

#[test]
fn test_validation_delegates_entirely_to_extension() {
    setup();
    // a zero output and a fee below the minimum would both fail the default rules
    let (tx, extension) = coin_creation(1, "mint", &[0]);
    tx.validate_transaction(&context()).unwrap();
    assert_eq!(extension.validations.load(Ordering::SeqCst), 1);

    let (tx, extension) = coin_creation(1, "", &[1]);
    assert!(matches!(
        tx.validate_transaction(&context()),
        Err(ValidationError::InvalidTransaction(_))
    ));
    assert_eq!(extension.validations.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sig_hash_delegates_to_extension() {
    setup();
    let (tx, _) = coin_creation(3, "mint", &[1]);
    let expected = hash_all(&(COIN_CREATION, 0u64, &b""[..], 3u64, &tx.coin_outputs)).unwrap();
    assert_eq!(tx.input_sig_hash(0, &[]).unwrap(), expected);
}

#[test]
fn test_blob_version_roundtrip() {
    setup();
    let key = PrivateKey::generate();
    let mut tx = Transaction {
        version: BLOB,
        coin_inputs: vec![CoinInput {
            parent_id: CoinOutputId(hash_bytes(b"parent")),
            unlocker: InputLockProxy::single_signature(key.public_key()),
        }],
        coin_outputs: vec![CoinOutput {
            value: Currency::new(50),
            unlock_hash: owner(),
        }],
        miner_fees: vec![Currency::new(100)],
        arbitrary_data: b"blob".to_vec(),
        ..Transaction::default()
    };
    tx.sign_coin_input(0, &key).unwrap();
    tx.verify_input_signatures().unwrap();

    let bytes = tx.to_bytes().unwrap();
    let mut expected = vec![2u8];
    expected.extend_from_slice(&encoding::marshal(&tx.encode_legacy_data().unwrap()).unwrap());
    assert_eq!(bytes, expected);

    let decoded = Transaction::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, tx);
    decoded.verify_input_signatures().unwrap();
    decoded.validate_transaction(&context()).unwrap();
    assert!(decoded.is_standard_transaction().is_ok());

    assert!(matches!(
        tx.to_json(),
        Err(TransactionError::MissingJsonEncoder(BLOB))
    ));
}

#[test]
fn test_unregistered_version_rejected() {
    setup();
    let mut bytes = vec![200u8];
    bytes.extend_from_slice(&encoding::marshal(&Vec::<u8>::new()).unwrap());
    assert!(matches!(
        Transaction::from_bytes(&bytes),
        Err(TransactionError::UnknownVersion(TransactionVersion(200)))
    ));

    let json = serde_json::json!({"version": 200, "data": {}});
    assert!(matches!(
        Transaction::from_json(json),
        Err(TransactionError::UnknownVersion(TransactionVersion(200)))
    ));

    let tx = Transaction {
        version: TransactionVersion(200),
        ..Transaction::default()
    };
    assert!(tx.is_standard_transaction().is_err());

    let (registered, _) = coin_creation(1, "mint", &[1]);
    assert!(registered.is_standard_transaction().is_ok());
    assert!(Transaction::new().is_standard_transaction().is_ok());
}

#[test]
fn test_registry_is_frozen_after_install() {
    setup();
    let global = TransactionRegistry::global();
    assert!(global.is_registered(COIN_CREATION));
    assert!(global.is_registered(BLOB));
    assert_eq!(global.len(), 2);

    let second = TransactionRegistry::builder().build().install();
    assert_eq!(second, Err(RegistryError::AlreadyInstalled));
}

#[test]
fn test_legacy_version_cannot_be_registered() {
    let result = TransactionRegistry::builder()
        .register(TransactionVersion::LEGACY, Arc::new(BlobDecoder));
    assert!(matches!(result, Err(RegistryError::ReservedVersion(_))));
}

proptest! {
    /// Registered extension versions round-trip through both encodings
    #[test]
    fn prop_coin_creation_roundtrip(
        nonce in any::<u64>(),
        description in "[a-z ]{1,24}",
        values in prop::collection::vec(1u64..u64::MAX, 0..4)
    ) {
        setup();
        let (tx, _) = coin_creation(nonce, &description, &values);

        let bytes = tx.to_bytes().unwrap();
        let decoded = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&decoded, &tx);
        prop_assert_eq!(decoded.to_bytes().unwrap(), bytes);

        let json = Transaction::from_json(tx.to_json().unwrap()).unwrap();
        prop_assert_eq!(json, tx);
    }
}
