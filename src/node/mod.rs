//! Node configuration

mod network;

pub use network::*;
