//! Double SHA-256 hashing for blocks, transactions, and governance records.

use meridian_types::{Block, Encodable, Hash256, Transaction};
use sha2::{Digest, Sha256};

/// Compute the double SHA-256 hash of arbitrary data.
pub fn hash256(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut output = [0u8; 32];
    output.copy_from_slice(&second);
    Hash256::new(output)
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn hash256_multi(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let first = hasher.finalize();
    let second = Sha256::digest(first);
    let mut output = [0u8; 32];
    output.copy_from_slice(&second);
    Hash256::new(output)
}

/// Incremental double-SHA-256 writer.
///
/// Fields are appended in consensus encoding order and finalized into the
/// record's hash. This is how the governance identity and signature hashes
/// are computed.
#[derive(Default)]
pub struct HashWriter {
    buf: Vec<u8>,
}

impl HashWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_encodable(&mut self, value: &impl Encodable) -> &mut Self {
        value.encode_to(&mut self.buf);
        self
    }

    pub fn finish(&self) -> Hash256 {
        hash256(&self.buf)
    }
}

/// Hash a transaction's canonical encoding to produce its txid.
pub fn hash_transaction(tx: &Transaction) -> Hash256 {
    hash256(&tx.encode())
}

/// Hash a block's header to produce its block hash.
pub fn hash_block(block: &Block) -> Hash256 {
    hash256(&block.header_bytes())
}
