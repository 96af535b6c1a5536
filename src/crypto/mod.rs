//! Cryptography module - BLAKE2b hashing and Schnorr signatures

mod hash;
mod schnorr;

pub use hash::*;
pub use schnorr::*;
