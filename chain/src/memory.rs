//! An in-memory chain with a transaction index and UTXO set.
//!
//! Deterministic stand-in for the node's chainstate: tests and the loader
//! exercise the engine against it exactly as they would against the real
//! node. Connecting a block updates the UTXO set and transaction index and
//! notifies registered validation listeners; disconnecting the tip reverses
//! all of it.

use crate::error::ChainError;
use crate::index::BlockIndex;
use crate::view::{ChainView, Coin, MempoolView, TxProvider, UtxoView, ValidationEvents};
use meridian_crypto::{hash_block, hash_transaction};
use meridian_types::{Block, Hash256, Outpoint, Transaction};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct ChainState {
    blocks: Vec<(BlockIndex, Block)>,
    tx_index: HashMap<Hash256, Transaction>,
    tx_heights: HashMap<Hash256, i32>,
    utxos: HashMap<Outpoint, Coin>,
    mempool_spent: HashSet<Outpoint>,
}

/// In-memory chain, transaction index, UTXO set, and mempool view.
#[derive(Default)]
pub struct MemoryChain {
    state: RwLock<ChainState>,
    listeners: RwLock<Vec<Arc<dyn ValidationEvents + Send + Sync>>>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validation listener. Listeners are notified of every
    /// subsequent connect and disconnect.
    pub fn register_listener(&self, listener: Arc<dyn ValidationEvents + Send + Sync>) {
        self.listeners.write().push(listener);
    }

    /// Append a block to the tip. Returns the new block's index entry.
    pub fn connect_block(&self, block: Block) -> BlockIndex {
        let index = {
            let mut state = self.state.write();
            let height = state.blocks.len() as i32;
            let index = BlockIndex::new(hash_block(&block), height, block.time);

            for tx in &block.vtx {
                let txid = hash_transaction(tx);
                for vin in &tx.vin {
                    if !vin.prevout.is_null() {
                        state.utxos.remove(&vin.prevout);
                    }
                }
                for (n, out) in tx.vout.iter().enumerate() {
                    state.utxos.insert(
                        Outpoint::new(txid, n as u32),
                        Coin {
                            output: out.clone(),
                            height,
                        },
                    );
                }
                state.tx_index.insert(txid, tx.clone());
                state.tx_heights.insert(txid, height);
            }
            state.blocks.push((index, block.clone()));
            index
        };

        for listener in self.listeners.read().iter() {
            listener.on_block_connected(&block, &index);
        }
        index
    }

    /// Remove the tip block, restoring the UTXO set to its prior contents.
    pub fn disconnect_tip(&self) -> Option<(Block, BlockIndex)> {
        let (index, block) = {
            let mut state = self.state.write();
            let (index, block) = state.blocks.pop()?;

            // Reverse transaction order so intra-block spends unwind cleanly.
            for tx in block.vtx.iter().rev() {
                let txid = hash_transaction(tx);
                for n in 0..tx.vout.len() {
                    state.utxos.remove(&Outpoint::new(txid, n as u32));
                }
                state.tx_index.remove(&txid);
                state.tx_heights.remove(&txid);

                for vin in &tx.vin {
                    if vin.prevout.is_null() {
                        continue;
                    }
                    let funding = state.tx_index.get(&vin.prevout.txid).cloned();
                    let funding_height = state.tx_heights.get(&vin.prevout.txid).copied();
                    if let (Some(funding), Some(height)) = (funding, funding_height) {
                        if let Some(out) = funding.vout.get(vin.prevout.vout as usize) {
                            state.utxos.insert(
                                vin.prevout,
                                Coin {
                                    output: out.clone(),
                                    height,
                                },
                            );
                        }
                    }
                }
            }
            (index, block)
        };

        for listener in self.listeners.read().iter() {
            listener.on_block_disconnected(&block, &index);
        }
        Some((block, index))
    }

    /// Mark an outpoint as spent by an unconfirmed transaction.
    pub fn add_mempool_spend(&self, outpoint: Outpoint) {
        self.state.write().mempool_spent.insert(outpoint);
    }

    pub fn clear_mempool(&self) {
        self.state.write().mempool_spent.clear();
    }
}

impl ChainView for MemoryChain {
    fn height(&self) -> i32 {
        self.state.read().blocks.len() as i32 - 1
    }

    fn block_index(&self, height: i32) -> Option<BlockIndex> {
        if height < 0 {
            return None;
        }
        self.state
            .read()
            .blocks
            .get(height as usize)
            .map(|(index, _)| *index)
    }

    fn read_block(&self, index: &BlockIndex) -> Result<Block, ChainError> {
        let state = self.state.read();
        let (stored, block) = state
            .blocks
            .get(index.height as usize)
            .ok_or(ChainError::BlockNotFound(index.height))?;
        if stored.hash != index.hash {
            return Err(ChainError::ReadFailed {
                hash: index.hash,
                reason: "hash mismatch at height".into(),
            });
        }
        Ok(block.clone())
    }
}

impl TxProvider for MemoryChain {
    fn get_transaction(&self, txid: &Hash256) -> Option<Transaction> {
        self.state.read().tx_index.get(txid).cloned()
    }
}

impl UtxoView for MemoryChain {
    fn get_coin(&self, outpoint: &Outpoint) -> Option<Coin> {
        self.state.read().utxos.get(outpoint).cloned()
    }
}

impl MempoolView for MemoryChain {
    fn is_spent(&self, outpoint: &Outpoint) -> bool {
        self.state.read().mempool_spent.contains(outpoint)
    }
}
