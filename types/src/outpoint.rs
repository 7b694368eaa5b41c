//! Transaction output reference.

use crate::hash::Hash256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(txid, output index)` pair identifying a specific transaction output.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Outpoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl Outpoint {
    /// The sentinel prevout used by coinbase inputs.
    pub const NULL: Self = Self {
        txid: Hash256::ZERO,
        vout: u32::MAX,
    };

    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_outpoint() {
        assert!(Outpoint::NULL.is_null());
        assert!(!Outpoint::new(Hash256::new([1; 32]), 0).is_null());
    }
}
