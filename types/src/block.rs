//! Block primitives.

use crate::encode::{put_compact_size, Encodable};
use crate::hash::Hash256;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// A block: header fields plus its transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub version: i32,
    pub prev_block: Hash256,
    pub merkle_root: Hash256,
    /// Block time in unix seconds. Every governance vote in the block
    /// inherits this timestamp.
    pub time: i64,
    pub vtx: Vec<Transaction>,
}

impl Block {
    /// A proof-of-stake block carries a coinstake as its second transaction.
    pub fn is_proof_of_stake(&self) -> bool {
        self.vtx.len() > 1 && self.vtx[1].is_coinstake()
    }

    /// The header bytes that define the block hash.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(80);
        out.extend_from_slice(&self.version.to_le_bytes());
        self.prev_block.encode_to(&mut out);
        self.merkle_root.encode_to(&mut out);
        out.extend_from_slice(&self.time.to_le_bytes());
        out
    }
}

impl Default for Block {
    fn default() -> Self {
        Self {
            version: 1,
            prev_block: Hash256::ZERO,
            merkle_root: Hash256::ZERO,
            time: 0,
            vtx: Vec::new(),
        }
    }
}

impl Encodable for Block {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.header_bytes());
        put_compact_size(out, self.vtx.len() as u64);
        for tx in &self.vtx {
            tx.encode_to(out);
        }
    }
}
