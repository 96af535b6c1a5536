//! Transaction data model
//!
//! Everything a transaction is made of, how it is identified and how its
//! version selects the rules that govern it.

mod currency;
mod extension;
mod ids;
mod outputs;
mod registry;
mod short_id;
mod specifier;
mod transaction;
mod unlock;

pub use currency::*;
pub use extension::{
    Extension, InputSigHasher, TransactionDataEncoder, TransactionDecoder, TransactionExtension,
    TransactionValidator,
};
pub use ids::*;
pub use outputs::*;
pub use registry::*;
pub use short_id::*;
pub use specifier::*;
pub use transaction::*;
pub use unlock::*;

use thiserror::Error;

/// Errors parsing the text form of a primitive
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("specifier string is {0} bytes, longer than 16")]
    SpecifierTooLong(usize),
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("checksum mismatch")]
    InvalidChecksum,
    #[error("invalid currency value: {0}")]
    InvalidCurrency(String),
}
