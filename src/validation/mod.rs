//! Transaction validation rules

mod transaction;

pub use transaction::*;
