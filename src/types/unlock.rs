//! Unlock hashes and unlockers
//!
//! An output is locked to an [`UnlockHash`]: the hash of a condition, tagged
//! with the condition's type. An input spends it by carrying an
//! [`InputLockProxy`] whose condition hashes to that unlock hash and whose
//! fulfillment proves the right to spend.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::{ParseError, Transaction};
use crate::crypto::{
    hash_bytes, Hash, PublicKey, SchnorrSignature, SignatureError, HASH_SIZE, PUBLIC_KEY_SIZE,
    SIGNATURE_SIZE,
};
use crate::encoding::EncodingError;

/// Number of checksum bytes appended to the string form of an unlock hash
pub const UNLOCK_HASH_CHECKSUM_SIZE: usize = 6;

const UNLOCK_HASH_STRING_LEN: usize = (1 + HASH_SIZE + UNLOCK_HASH_CHECKSUM_SIZE) * 2;

/// Unlock errors
#[derive(Debug, Error)]
pub enum UnlockError {
    #[error("non-standard unlock type {0}")]
    NonStandardUnlockType(UnlockType),
    #[error("unlocker carries no signature")]
    MissingSignature,
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("cannot compute signature hash: {0}")]
    Encoding(#[from] EncodingError),
    #[error("malformed unlocker: {0}")]
    Malformed(String),
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockType(pub u8);

impl UnlockType {
    pub const NIL: UnlockType = UnlockType(0);
    pub const SINGLE_SIGNATURE: UnlockType = UnlockType(1);
}

impl fmt::Display for UnlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address an output is locked to
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnlockHash {
    pub unlock_type: UnlockType,
    pub hash: Hash,
}

impl UnlockHash {
    pub fn new(unlock_type: UnlockType, hash: Hash) -> Self {
        UnlockHash { unlock_type, hash }
    }

    fn checksum(&self) -> [u8; UNLOCK_HASH_CHECKSUM_SIZE] {
        let mut data = Vec::with_capacity(1 + HASH_SIZE);
        data.push(self.unlock_type.0);
        data.extend_from_slice(&self.hash.0);
        let digest = hash_bytes(&data);
        let mut checksum = [0u8; UNLOCK_HASH_CHECKSUM_SIZE];
        checksum.copy_from_slice(&digest.0[..UNLOCK_HASH_CHECKSUM_SIZE]);
        checksum
    }
}

impl fmt::Display for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{}{}",
            self.unlock_type.0,
            self.hash.to_hex(),
            hex::encode(self.checksum())
        )
    }
}

impl fmt::Debug for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnlockHash({})", self)
    }
}

impl FromStr for UnlockHash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != UNLOCK_HASH_STRING_LEN {
            return Err(ParseError::InvalidLength {
                expected: UNLOCK_HASH_STRING_LEN,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s)?;
        let (head, checksum) = bytes.split_at(1 + HASH_SIZE);
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&head[1..]);
        let uh = UnlockHash::new(UnlockType(head[0]), Hash(hash));
        if uh.checksum() != checksum {
            return Err(ParseError::InvalidChecksum);
        }
        Ok(uh)
    }
}

impl Serialize for UnlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            (self.unlock_type, self.hash).serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for UnlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let (unlock_type, hash) = <(UnlockType, Hash)>::deserialize(deserializer)?;
            Ok(UnlockHash { unlock_type, hash })
        }
    }
}

/// Condition and fulfillment carried by an input
///
/// Binary layout: `[type][u64 len][condition][u64 len][fulfillment]`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InputLockProxy {
    /// A single public key; fulfilled by a signature over the input signature hash.
    SingleSignature {
        public_key: PublicKey,
        signature: Option<SchnorrSignature>,
    },
    /// Any other unlock type, kept as raw bytes so it still round-trips.
    ///
    /// Never carries [`UnlockType::SINGLE_SIGNATURE`]; build through
    /// [`InputLockProxy::raw`] to have known types parsed. Encoding that state
    /// fails.
    Raw {
        unlock_type: UnlockType,
        condition: Vec<u8>,
        fulfillment: Vec<u8>,
    },
}

impl InputLockProxy {
    /// Unsigned single-signature unlocker for the given key
    pub fn single_signature(public_key: PublicKey) -> Self {
        InputLockProxy::SingleSignature {
            public_key,
            signature: None,
        }
    }

    /// Unlocker from its wire parts. Known unlock types are parsed into their
    /// typed form and rejected when malformed.
    pub fn raw(
        unlock_type: UnlockType,
        condition: Vec<u8>,
        fulfillment: Vec<u8>,
    ) -> Result<Self, UnlockError> {
        InputLockProxy::from_parts::<de::value::Error>(unlock_type, condition, fulfillment)
            .map_err(|e| UnlockError::Malformed(e.to_string()))
    }

    pub fn unlock_type(&self) -> UnlockType {
        match self {
            InputLockProxy::SingleSignature { .. } => UnlockType::SINGLE_SIGNATURE,
            InputLockProxy::Raw { unlock_type, .. } => *unlock_type,
        }
    }

    pub fn condition_bytes(&self) -> Vec<u8> {
        match self {
            InputLockProxy::SingleSignature { public_key, .. } => public_key.0.to_vec(),
            InputLockProxy::Raw { condition, .. } => condition.clone(),
        }
    }

    pub fn fulfillment_bytes(&self) -> Vec<u8> {
        match self {
            InputLockProxy::SingleSignature { signature, .. } => {
                signature.map(|s| s.0.to_vec()).unwrap_or_default()
            }
            InputLockProxy::Raw { fulfillment, .. } => fulfillment.clone(),
        }
    }

    /// The unlock hash of the output this unlocker can spend
    pub fn unlock_hash(&self) -> UnlockHash {
        UnlockHash::new(self.unlock_type(), hash_bytes(&self.condition_bytes()))
    }

    /// Attach a signature to a single-signature unlocker.
    pub fn fulfill(&mut self, sig: SchnorrSignature) -> Result<(), UnlockError> {
        match self {
            InputLockProxy::SingleSignature { signature, .. } => {
                *signature = Some(sig);
                Ok(())
            }
            InputLockProxy::Raw { unlock_type, .. } => {
                Err(UnlockError::NonStandardUnlockType(*unlock_type))
            }
        }
    }

    /// Whether this node understands and would relay this unlocker.
    pub fn is_standard(&self) -> Result<(), UnlockError> {
        match self {
            InputLockProxy::SingleSignature { signature: Some(_), .. } => Ok(()),
            InputLockProxy::SingleSignature { signature: None, .. } => {
                Err(UnlockError::MissingSignature)
            }
            InputLockProxy::Raw { unlock_type, .. } => {
                Err(UnlockError::NonStandardUnlockType(*unlock_type))
            }
        }
    }

    /// Verify the fulfillment against the signature hash of the given input.
    pub fn unlock(&self, input_index: u64, tx: &Transaction) -> Result<(), UnlockError> {
        match self {
            InputLockProxy::SingleSignature {
                public_key,
                signature,
            } => {
                let signature = signature.as_ref().ok_or(UnlockError::MissingSignature)?;
                let sig_hash = tx.input_sig_hash(input_index, &[])?;
                public_key.verify(&sig_hash, signature)?;
                Ok(())
            }
            InputLockProxy::Raw { unlock_type, .. } => {
                Err(UnlockError::NonStandardUnlockType(*unlock_type))
            }
        }
    }

    fn from_parts<E: de::Error>(
        unlock_type: UnlockType,
        condition: Vec<u8>,
        fulfillment: Vec<u8>,
    ) -> Result<Self, E> {
        if unlock_type != UnlockType::SINGLE_SIGNATURE {
            return Ok(InputLockProxy::Raw {
                unlock_type,
                condition,
                fulfillment,
            });
        }
        let public_key = PublicKey::from_slice(&condition).ok_or_else(|| {
            E::custom(format!(
                "single signature condition must be {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                condition.len()
            ))
        })?;
        let signature = match fulfillment.len() {
            0 => None,
            SIGNATURE_SIZE => SchnorrSignature::from_slice(&fulfillment),
            n => {
                return Err(E::custom(format!(
                    "single signature fulfillment must be empty or {} bytes, got {}",
                    SIGNATURE_SIZE, n
                )))
            }
        };
        Ok(InputLockProxy::SingleSignature {
            public_key,
            signature,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct JsonProxy {
    #[serde(rename = "type")]
    unlock_type: UnlockType,
    condition: serde_json::Value,
    fulfillment: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct JsonSingleSignatureCondition {
    publickey: PublicKey,
}

#[derive(Serialize, Deserialize)]
struct JsonSingleSignatureFulfillment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<SchnorrSignature>,
}

impl Serialize for InputLockProxy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;

        if let InputLockProxy::Raw {
            unlock_type: UnlockType::SINGLE_SIGNATURE,
            ..
        } = self
        {
            return Err(S::Error::custom(
                "single signature unlocker must use its typed form",
            ));
        }
        if !serializer.is_human_readable() {
            return (
                self.unlock_type(),
                self.condition_bytes(),
                self.fulfillment_bytes(),
            )
                .serialize(serializer);
        }
        let (condition, fulfillment) = match self {
            InputLockProxy::SingleSignature {
                public_key,
                signature,
            } => (
                serde_json::to_value(JsonSingleSignatureCondition {
                    publickey: *public_key,
                }),
                serde_json::to_value(JsonSingleSignatureFulfillment {
                    signature: *signature,
                }),
            ),
            InputLockProxy::Raw {
                condition,
                fulfillment,
                ..
            } => (
                serde_json::to_value(hex::encode(condition)),
                serde_json::to_value(hex::encode(fulfillment)),
            ),
        };
        JsonProxy {
            unlock_type: self.unlock_type(),
            condition: condition.map_err(S::Error::custom)?,
            fulfillment: fulfillment.map_err(S::Error::custom)?,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InputLockProxy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if !deserializer.is_human_readable() {
            let (unlock_type, condition, fulfillment) =
                <(UnlockType, Vec<u8>, Vec<u8>)>::deserialize(deserializer)?;
            return InputLockProxy::from_parts(unlock_type, condition, fulfillment);
        }
        let proxy = JsonProxy::deserialize(deserializer)?;
        if proxy.unlock_type == UnlockType::SINGLE_SIGNATURE {
            let condition: JsonSingleSignatureCondition =
                serde_json::from_value(proxy.condition).map_err(de::Error::custom)?;
            let fulfillment: JsonSingleSignatureFulfillment =
                serde_json::from_value(proxy.fulfillment).map_err(de::Error::custom)?;
            return Ok(InputLockProxy::SingleSignature {
                public_key: condition.publickey,
                signature: fulfillment.signature,
            });
        }
        let decode_hex = |value: serde_json::Value| -> Result<Vec<u8>, D::Error> {
            let s: String = serde_json::from_value(value).map_err(de::Error::custom)?;
            hex::decode(s).map_err(de::Error::custom)
        };
        Ok(InputLockProxy::Raw {
            unlock_type: proxy.unlock_type,
            condition: decode_hex(proxy.condition)?,
            fulfillment: decode_hex(proxy.fulfillment)?,
        })
    }
}
