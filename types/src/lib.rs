//! Fundamental types for the Meridian protocol.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: hashes, coin amounts, outpoints, keys, scripts, transactions,
//! blocks, and the consensus parameters.

pub mod amount;
pub mod block;
pub mod encode;
pub mod error;
pub mod hash;
pub mod keys;
pub mod outpoint;
pub mod params;
pub mod script;
pub mod transaction;

pub use amount::Amount;
pub use block::Block;
pub use encode::{Cursor, DecodeError, Encodable};
pub use error::MeridianError;
pub use hash::Hash256;
pub use keys::{CompactSignature, KeyId, KeyPair, PrivateKey, PublicKey};
pub use outpoint::Outpoint;
pub use params::ConsensusParams;
pub use script::Script;
pub use transaction::{Transaction, TxIn, TxOut};
