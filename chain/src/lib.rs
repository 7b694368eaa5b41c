//! Chain access contracts for the Meridian governance engine.
//!
//! The engine never owns the chain: blocks, transactions, the UTXO set, and
//! the mempool belong to the node. This crate defines the traits the engine
//! consumes ([`ChainView`], [`TxProvider`], [`UtxoView`], [`MempoolView`],
//! [`ValidationEvents`]) and an in-memory implementation used by tests.

pub mod error;
pub mod index;
pub mod memory;
pub mod view;

pub use error::ChainError;
pub use index::BlockIndex;
pub use memory::MemoryChain;
pub use view::{ChainView, Coin, MempoolView, TxProvider, UtxoView, ValidationEvents};
