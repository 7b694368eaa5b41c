//! Block index entries.

use meridian_types::Hash256;
use serde::{Deserialize, Serialize};

/// The chain's view of one block: its hash, height, and timestamp.
///
/// Governance record extraction stamps proposals and votes with the height
/// and time of the block index they were found under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndex {
    pub hash: Hash256,
    pub height: i32,
    pub time: i64,
}

impl BlockIndex {
    pub fn new(hash: Hash256, height: i32, time: i64) -> Self {
        Self { hash, height, time }
    }
}
