//! Transactions
//!
//! A transaction moves coins and blockstakes: it spends earlier outputs
//! through its inputs and creates new outputs. Its version byte decides which
//! rules apply. Version 0 is the legacy format built into this crate. Every
//! other version is governed by the decoder registered for it and by the
//! [`TransactionExtension`](super::TransactionExtension) that decoder
//! attaches.
//!
//! # Binary layout
//!
//! ```text
//! version 0:  [version][coin inputs][coin outputs][bs inputs][bs outputs][fees][arbitrary data]
//! version n:  [version][u64 len][payload]
//! ```
//!
//! The payload is produced by the extension's data encoder, or is the six
//! legacy fields encoded as one blob when the extension has none.
//!
//! # Identifiers
//!
//! A version 0 transaction is identified by the hash of its six legacy fields
//! without the version byte. Any other version is identified by the hash of
//! its full canonical encoding. Output IDs prefix the same hash input with a
//! [`Specifier`] and suffix it with the output index.
//!
//! A transaction must not be mutated once one of its IDs has been handed out
//! as a key.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::{
    BlockStakeInput, BlockStakeOutput, BlockStakeOutputId, CoinInput, CoinOutput, CoinOutputId,
    Currency, Extension, Specifier, TransactionDataEncoder, TransactionId, TransactionRegistry,
    UnlockError, SPECIFIER_BLOCKSTAKE_OUTPUT, SPECIFIER_COIN_OUTPUT,
};
use crate::crypto::{hash_all, Hash, Hasher, PrivateKey};
use crate::encoding::{self, EncodingError};
use crate::validation::{self, TransactionValidationContext, ValidationError};

/// Transaction format version
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionVersion(pub u8);

impl TransactionVersion {
    /// The built-in legacy format
    pub const LEGACY: TransactionVersion = TransactionVersion(0);

    pub fn is_legacy(self) -> bool {
        self == Self::LEGACY
    }
}

impl fmt::Display for TransactionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TransactionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Transaction errors
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("invalid transaction version {0}")]
    UnknownVersion(TransactionVersion),
    #[error("transaction version {0} has no json encoder")]
    MissingJsonEncoder(TransactionVersion),
    #[error("input index {index} out of range ({count} inputs)")]
    InputOutOfRange { index: usize, count: usize },
    #[error(transparent)]
    Unlock(#[from] UnlockError),
    #[error("invalid transaction data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub version: TransactionVersion,
    pub coin_inputs: Vec<CoinInput>,
    pub coin_outputs: Vec<CoinOutput>,
    pub block_stake_inputs: Vec<BlockStakeInput>,
    pub block_stake_outputs: Vec<BlockStakeOutput>,
    pub miner_fees: Vec<Currency>,
    pub arbitrary_data: Vec<u8>,
    /// Version-specific payload and behaviour; `None` for legacy transactions.
    pub extension: Option<Extension>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        let extensions_equal = match (&self.extension, &other.extension) {
            (None, None) => true,
            (Some(a), Some(b)) => a.dyn_eq(b.as_ref()),
            _ => false,
        };
        self.version == other.version
            && self.coin_inputs == other.coin_inputs
            && self.coin_outputs == other.coin_outputs
            && self.block_stake_inputs == other.block_stake_inputs
            && self.block_stake_outputs == other.block_stake_outputs
            && self.miner_fees == other.miner_fees
            && self.arbitrary_data == other.arbitrary_data
            && extensions_equal
    }
}

impl Eq for Transaction {}

/// The six legacy fields, borrowed for encoding and hashing.
#[derive(Serialize)]
struct LegacyFields<'a> {
    coin_inputs: &'a [CoinInput],
    coin_outputs: &'a [CoinOutput],
    block_stake_inputs: &'a [BlockStakeInput],
    block_stake_outputs: &'a [BlockStakeOutput],
    miner_fees: &'a [Currency],
    arbitrary_data: &'a [u8],
}

#[derive(Deserialize)]
struct LegacyData {
    coin_inputs: Vec<CoinInput>,
    coin_outputs: Vec<CoinOutput>,
    block_stake_inputs: Vec<BlockStakeInput>,
    block_stake_outputs: Vec<BlockStakeOutput>,
    miner_fees: Vec<Currency>,
    arbitrary_data: Vec<u8>,
}

impl LegacyData {
    fn into_transaction(self, version: TransactionVersion) -> Transaction {
        Transaction {
            version,
            coin_inputs: self.coin_inputs,
            coin_outputs: self.coin_outputs,
            block_stake_inputs: self.block_stake_inputs,
            block_stake_outputs: self.block_stake_outputs,
            miner_fees: self.miner_fees,
            arbitrary_data: self.arbitrary_data,
            extension: None,
        }
    }
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
struct JsonLegacyFields<'a> {
    #[serde(rename = "coininputs")]
    coin_inputs: &'a [CoinInput],
    #[serde(rename = "coinoutputs", skip_serializing_if = "is_empty")]
    coin_outputs: &'a [CoinOutput],
    #[serde(rename = "blockstakeinputs", skip_serializing_if = "is_empty")]
    block_stake_inputs: &'a [BlockStakeInput],
    #[serde(rename = "blockstakeoutputs", skip_serializing_if = "is_empty")]
    block_stake_outputs: &'a [BlockStakeOutput],
    #[serde(rename = "minerfees")]
    miner_fees: &'a [Currency],
    #[serde(
        rename = "arbitrarydata",
        skip_serializing_if = "is_empty",
        with = "base64_data"
    )]
    arbitrary_data: &'a [u8],
}

#[derive(Deserialize)]
struct JsonLegacyData {
    #[serde(rename = "coininputs", default, deserialize_with = "nullable_vec")]
    coin_inputs: Vec<CoinInput>,
    #[serde(rename = "coinoutputs", default, deserialize_with = "nullable_vec")]
    coin_outputs: Vec<CoinOutput>,
    #[serde(rename = "blockstakeinputs", default, deserialize_with = "nullable_vec")]
    block_stake_inputs: Vec<BlockStakeInput>,
    #[serde(rename = "blockstakeoutputs", default, deserialize_with = "nullable_vec")]
    block_stake_outputs: Vec<BlockStakeOutput>,
    #[serde(rename = "minerfees", default, deserialize_with = "nullable_vec")]
    miner_fees: Vec<Currency>,
    #[serde(rename = "arbitrarydata", default, with = "base64_data")]
    arbitrary_data: Vec<u8>,
}

impl From<JsonLegacyData> for LegacyData {
    fn from(data: JsonLegacyData) -> Self {
        LegacyData {
            coin_inputs: data.coin_inputs,
            coin_outputs: data.coin_outputs,
            block_stake_inputs: data.block_stake_inputs,
            block_stake_outputs: data.block_stake_outputs,
            miner_fees: data.miner_fees,
            arbitrary_data: data.arbitrary_data,
        }
    }
}

/// `null` and a missing field both decode to an empty list.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T: AsRef<[u8]>>(data: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => STANDARD.decode(s).map_err(de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// `{"version": n, "data": ...}`
#[derive(Serialize, Deserialize)]
struct JsonEnvelope {
    version: TransactionVersion,
    data: serde_json::Value,
}

impl Transaction {
    /// Empty legacy transaction
    pub fn new() -> Self {
        Self::default()
    }

    fn legacy_fields(&self) -> LegacyFields<'_> {
        LegacyFields {
            coin_inputs: &self.coin_inputs,
            coin_outputs: &self.coin_outputs,
            block_stake_inputs: &self.block_stake_inputs,
            block_stake_outputs: &self.block_stake_outputs,
            miner_fees: &self.miner_fees,
            arbitrary_data: &self.arbitrary_data,
        }
    }

    fn encoder(&self) -> Option<&dyn TransactionDataEncoder> {
        self.extension.as_ref().and_then(|ext| ext.encoder())
    }

    /// The six legacy fields encoded as one flat payload.
    ///
    /// Extensions that keep the legacy shape can use this as their binary payload.
    pub fn encode_legacy_data(&self) -> Result<Vec<u8>, EncodingError> {
        encoding::marshal(&self.legacy_fields())
    }

    /// Inverse of [`encode_legacy_data`](Self::encode_legacy_data).
    pub fn decode_legacy_data(
        version: TransactionVersion,
        data: &[u8],
    ) -> Result<Transaction, EncodingError> {
        let data: LegacyData = encoding::unmarshal(data)?;
        Ok(data.into_transaction(version))
    }

    /// The six legacy fields as the JSON `data` object.
    pub fn json_encode_legacy_data(&self) -> Result<serde_json::Value, EncodingError> {
        Ok(serde_json::to_value(JsonLegacyFields {
            coin_inputs: &self.coin_inputs,
            coin_outputs: &self.coin_outputs,
            block_stake_inputs: &self.block_stake_inputs,
            block_stake_outputs: &self.block_stake_outputs,
            miner_fees: &self.miner_fees,
            arbitrary_data: &self.arbitrary_data,
        })?)
    }

    /// Inverse of [`json_encode_legacy_data`](Self::json_encode_legacy_data).
    pub fn json_decode_legacy_data(
        version: TransactionVersion,
        data: serde_json::Value,
    ) -> Result<Transaction, EncodingError> {
        let data: JsonLegacyData = serde_json::from_value(data)?;
        Ok(LegacyData::from(data).into_transaction(version))
    }

    /// Payload written after the version byte of a non-legacy transaction.
    fn data_blob(&self) -> Result<Vec<u8>, EncodingError> {
        match self.encoder() {
            Some(encoder) => encoder.encode_transaction_data(self),
            None => self.encode_legacy_data(),
        }
    }

    fn json_data(&self) -> Result<serde_json::Value, TransactionError> {
        if let Some(encoder) = self.encoder() {
            return Ok(encoder.json_encode_transaction_data(self)?);
        }
        if !self.version.is_legacy() {
            return Err(TransactionError::MissingJsonEncoder(self.version));
        }
        Ok(self.json_encode_legacy_data()?)
    }

    /// Canonical binary encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        encoding::marshal(self)
    }

    /// Decode using the installed registry for non-legacy versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Transaction, TransactionError> {
        Self::from_bytes_with(bytes, TransactionRegistry::global())
    }

    /// Decode using an explicit registry for non-legacy versions.
    pub fn from_bytes_with(
        bytes: &[u8],
        registry: &TransactionRegistry,
    ) -> Result<Transaction, TransactionError> {
        let (&version, rest) = bytes.split_first().ok_or(EncodingError::UnexpectedEof)?;
        let version = TransactionVersion(version);
        if version.is_legacy() {
            return Ok(Self::decode_legacy_data(version, rest)?);
        }
        let payload: Vec<u8> = encoding::unmarshal(rest)?;
        registry
            .decoder(version)
            .decode_transaction_data(version, &payload)
    }

    /// JSON envelope
    pub fn to_json(&self) -> Result<serde_json::Value, TransactionError> {
        let envelope = JsonEnvelope {
            version: self.version,
            data: self.json_data()?,
        };
        serde_json::to_value(envelope).map_err(|e| EncodingError::from(e).into())
    }

    pub fn from_json(value: serde_json::Value) -> Result<Transaction, TransactionError> {
        Self::from_json_with(value, TransactionRegistry::global())
    }

    pub fn from_json_with(
        value: serde_json::Value,
        registry: &TransactionRegistry,
    ) -> Result<Transaction, TransactionError> {
        let envelope: JsonEnvelope = serde_json::from_value(value).map_err(EncodingError::from)?;
        Self::from_envelope(envelope, registry)
    }

    fn from_envelope(
        envelope: JsonEnvelope,
        registry: &TransactionRegistry,
    ) -> Result<Transaction, TransactionError> {
        let JsonEnvelope { version, data } = envelope;
        if version.is_legacy() {
            return Ok(Self::json_decode_legacy_data(version, data)?);
        }
        registry
            .decoder(version)
            .json_decode_transaction_data(version, data)
    }

    pub fn id(&self) -> Result<TransactionId, EncodingError> {
        let hash = if self.version.is_legacy() {
            hash_all(&self.legacy_fields())?
        } else {
            hash_all(self)?
        };
        Ok(TransactionId(hash))
    }

    fn output_id(&self, specifier: Specifier, index: u64) -> Result<Hash, EncodingError> {
        if self.version.is_legacy() {
            hash_all(&(specifier, self.legacy_fields(), index))
        } else {
            hash_all(&(specifier, self, index))
        }
    }

    /// ID of the coin output at `index`
    pub fn coin_output_id(&self, index: u64) -> Result<CoinOutputId, EncodingError> {
        self.output_id(SPECIFIER_COIN_OUTPUT, index).map(CoinOutputId)
    }

    /// ID of the blockstake output at `index`
    pub fn block_stake_output_id(&self, index: u64) -> Result<BlockStakeOutputId, EncodingError> {
        self.output_id(SPECIFIER_BLOCKSTAKE_OUTPUT, index)
            .map(BlockStakeOutputId)
    }

    /// Sum of all coin outputs and miner fees.
    pub fn coin_output_sum(&self) -> Currency {
        self.coin_outputs
            .iter()
            .map(|output| &output.value)
            .chain(self.miner_fees.iter())
            .sum()
    }

    /// Hash signed by the unlocker of the input at `input_index`.
    ///
    /// Coin and blockstake inputs share the index space of their own list;
    /// `extra` is appended to the hash input as raw bytes.
    pub fn input_sig_hash(&self, input_index: u64, extra: &[u8]) -> Result<Hash, EncodingError> {
        if let Some(hasher) = self.extension.as_ref().and_then(|ext| ext.sig_hasher()) {
            return hasher.input_sig_hash(self, input_index, extra);
        }
        let mut hasher = Hasher::new();
        if !self.version.is_legacy() {
            hasher.encode(&self.version)?;
        }
        hasher.encode(&input_index)?;
        hasher.update(extra);
        for input in &self.coin_inputs {
            hasher.encode(&(input.parent_id, input.unlocker.unlock_hash()))?;
        }
        hasher.encode(&self.coin_outputs)?;
        for input in &self.block_stake_inputs {
            hasher.encode(&(input.parent_id, input.unlocker.unlock_hash()))?;
        }
        hasher.encode(&self.block_stake_outputs)?;
        hasher.encode(&self.miner_fees)?;
        hasher.encode(&self.arbitrary_data)?;
        Ok(hasher.finalize())
    }

    /// Sign the coin input at `index` with a single-signature key.
    pub fn sign_coin_input(&mut self, index: usize, key: &PrivateKey) -> Result<(), TransactionError> {
        let count = self.coin_inputs.len();
        if index >= count {
            return Err(TransactionError::InputOutOfRange { index, count });
        }
        let sig_hash = self.input_sig_hash(index as u64, &[])?;
        let signature = key.sign(&sig_hash).map_err(UnlockError::from)?;
        self.coin_inputs[index].unlocker.fulfill(signature)?;
        Ok(())
    }

    /// Sign the blockstake input at `index` with a single-signature key.
    pub fn sign_block_stake_input(
        &mut self,
        index: usize,
        key: &PrivateKey,
    ) -> Result<(), TransactionError> {
        let count = self.block_stake_inputs.len();
        if index >= count {
            return Err(TransactionError::InputOutOfRange { index, count });
        }
        let sig_hash = self.input_sig_hash(index as u64, &[])?;
        let signature = key.sign(&sig_hash).map_err(UnlockError::from)?;
        self.block_stake_inputs[index].unlocker.fulfill(signature)?;
        Ok(())
    }

    /// Check every input's fulfillment against its signature hash.
    pub fn verify_input_signatures(&self) -> Result<(), TransactionError> {
        for (index, input) in self.coin_inputs.iter().enumerate() {
            input.unlocker.unlock(index as u64, self)?;
        }
        for (index, input) in self.block_stake_inputs.iter().enumerate() {
            input.unlocker.unlock(index as u64, self)?;
        }
        Ok(())
    }

    /// Validate against the chain context.
    ///
    /// An extension with its own validator owns all validation for its
    /// version; otherwise the default legacy rules apply.
    pub fn validate_transaction(
        &self,
        ctx: &TransactionValidationContext,
    ) -> Result<(), ValidationError> {
        let result = match self.extension.as_ref().and_then(|ext| ext.validator()) {
            Some(validator) => validator.validate_transaction(ctx, self),
            None => validation::default_transaction_validation(ctx, self),
        };
        if let Err(err) = &result {
            tracing::debug!(version = self.version.0, height = ctx.block_height, %err, "transaction rejected");
        }
        result
    }

    /// Whether this node relays transactions of this version.
    pub fn is_standard_transaction(&self) -> Result<(), TransactionError> {
        self.is_standard_transaction_with(TransactionRegistry::global())
    }

    pub fn is_standard_transaction_with(
        &self,
        registry: &TransactionRegistry,
    ) -> Result<(), TransactionError> {
        if self.version.is_legacy() || registry.is_registered(self.version) {
            Ok(())
        } else {
            Err(TransactionError::UnknownVersion(self.version))
        }
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;

        if serializer.is_human_readable() {
            let data = self.json_data().map_err(S::Error::custom)?;
            return JsonEnvelope {
                version: self.version,
                data,
            }
            .serialize(serializer);
        }
        if self.version.is_legacy() && self.encoder().is_none() {
            return (self.version, self.legacy_fields()).serialize(serializer);
        }
        let payload = self.data_blob().map_err(S::Error::custom)?;
        (self.version, payload).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let registry = TransactionRegistry::global();
        if deserializer.is_human_readable() {
            let envelope = JsonEnvelope::deserialize(deserializer)?;
            return Transaction::from_envelope(envelope, registry).map_err(de::Error::custom);
        }
        deserializer.deserialize_tuple(2, BinaryVisitor { registry })
    }
}

struct BinaryVisitor {
    registry: &'static TransactionRegistry,
}

impl<'de> Visitor<'de> for BinaryVisitor {
    type Value = Transaction;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a versioned transaction")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Transaction, A::Error> {
        let version: TransactionVersion = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        if version.is_legacy() {
            let data: LegacyData = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(1, &self))?;
            return Ok(data.into_transaction(version));
        }
        let payload: Vec<u8> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        self.registry
            .decoder(version)
            .decode_transaction_data(version, &payload)
            .map_err(de::Error::custom)
    }
}
