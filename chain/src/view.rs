//! The collaborator traits the governance engine consumes.

use crate::error::ChainError;
use crate::index::BlockIndex;
use meridian_types::{Block, Hash256, Outpoint, Transaction, TxOut};

/// A confirmed, unspent transaction output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coin {
    pub output: TxOut,
    /// Height of the block that created the output.
    pub height: i32,
}

/// Read access to the active chain.
pub trait ChainView {
    /// Height of the chain tip, or -1 for an empty chain.
    fn height(&self) -> i32;

    /// The block index at the given height on the active chain.
    fn block_index(&self, height: i32) -> Option<BlockIndex>;

    /// Read the full block for an index entry.
    fn read_block(&self, index: &BlockIndex) -> Result<Block, ChainError>;
}

/// Transaction lookup by txid (the node's transaction index).
pub trait TxProvider {
    fn get_transaction(&self, txid: &Hash256) -> Option<Transaction>;
}

/// Access to the confirmed UTXO set.
pub trait UtxoView {
    fn get_coin(&self, outpoint: &Outpoint) -> Option<Coin>;
}

/// Mempool spent-ness queries for outputs with in-flight spends.
pub trait MempoolView {
    fn is_spent(&self, outpoint: &Outpoint) -> bool;
}

/// Callbacks fired by the node's validation pipeline as blocks connect to
/// and disconnect from the active chain. The governance engine registers
/// itself as a listener.
pub trait ValidationEvents {
    fn on_block_connected(&self, block: &Block, index: &BlockIndex);
    fn on_block_disconnected(&self, block: &Block, index: &BlockIndex);
}
