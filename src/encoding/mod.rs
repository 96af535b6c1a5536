//! Canonical binary encoding
//!
//! Every consensus object is encoded with bincode configured for fixed-width
//! little-endian integers. With that configuration the wire shape is:
//!
//! - `u8` as a single byte, every other integer as 8 bytes little-endian
//! - byte strings and sequences as a `u64` length prefix followed by the items
//! - fixed-size arrays as their raw bytes
//! - structs and tuples as the plain concatenation of their fields
//!
//! Types that also have a JSON form branch on `is_human_readable()`, so the
//! same `Serialize` impl produces both shapes.

use std::io::Write;

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Upper bound on the number of bytes a single decode call may consume.
pub const MAX_DECODE_LEN: u64 = 5 * 1024 * 1024;

/// Encoding errors
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("malformed binary encoding: {0}")]
    Binary(#[from] bincode::Error),
    #[error("malformed json encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected end of input")]
    UnexpectedEof,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// Encode a value into its canonical byte representation.
pub fn marshal<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodingError> {
    Ok(codec().serialize(value)?)
}

/// Stream the canonical encoding of a value into a writer.
pub fn marshal_into<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
) -> Result<(), EncodingError> {
    codec().serialize_into(writer, value)?;
    Ok(())
}

/// Decode a value from its canonical byte representation.
///
/// The whole input must be consumed; trailing bytes are an error.
pub fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EncodingError> {
    Ok(codec().with_limit(MAX_DECODE_LEN).deserialize(bytes)?)
}
