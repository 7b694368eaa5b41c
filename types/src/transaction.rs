//! Transaction primitives.

use crate::amount::Amount;
use crate::encode::{put_compact_size, put_i64_le, put_u32_le, Encodable};
use crate::outpoint::Outpoint;
use crate::script::Script;
use serde::{Deserialize, Serialize};

/// A transaction input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: Outpoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prevout: Outpoint) -> Self {
        Self {
            prevout,
            script_sig: Script::default(),
            sequence: u32::MAX,
        }
    }
}

/// A transaction output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }

    /// An empty output — value zero and no script. The first output of a
    /// coinstake transaction has this shape.
    pub fn is_empty(&self) -> bool {
        self.value.is_zero() && self.script_pubkey.is_empty()
    }
}

/// A transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            version: 1,
            vin: Vec::new(),
            vout: Vec::new(),
            lock_time: 0,
        }
    }
}

impl Transaction {
    /// True for the block-reward transaction: a single input with the null
    /// prevout.
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].prevout.is_null()
    }

    /// True for the staking transaction of a proof-of-stake block: real
    /// inputs, and an empty marker first output.
    pub fn is_coinstake(&self) -> bool {
        !self.vin.is_empty()
            && !self.vin[0].prevout.is_null()
            && self.vout.len() >= 2
            && self.vout[0].is_empty()
    }
}

impl Encodable for TxIn {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.prevout.encode_to(out);
        put_compact_size(out, self.script_sig.as_bytes().len() as u64);
        out.extend_from_slice(self.script_sig.as_bytes());
        put_u32_le(out, self.sequence);
    }
}

impl Encodable for TxOut {
    fn encode_to(&self, out: &mut Vec<u8>) {
        put_i64_le(out, self.value.units());
        put_compact_size(out, self.script_pubkey.as_bytes().len() as u64);
        out.extend_from_slice(self.script_pubkey.as_bytes());
    }
}

impl Encodable for Transaction {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        put_compact_size(out, self.vin.len() as u64);
        for vin in &self.vin {
            vin.encode_to(out);
        }
        put_compact_size(out, self.vout.len() as u64);
        for vout in &self.vout {
            vout.encode_to(out);
        }
        put_u32_le(out, self.lock_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Hash256;

    fn coinbase() -> Transaction {
        Transaction {
            vin: vec![TxIn::new(Outpoint::NULL)],
            vout: vec![TxOut::new(Amount::from_coins(50), Script::default())],
            ..Default::default()
        }
    }

    #[test]
    fn coinbase_detection() {
        assert!(coinbase().is_coinbase());
        assert!(!coinbase().is_coinstake());
    }

    #[test]
    fn coinstake_detection() {
        let tx = Transaction {
            vin: vec![TxIn::new(Outpoint::new(Hash256::new([1; 32]), 0))],
            vout: vec![
                TxOut::default(),
                TxOut::new(Amount::from_coins(200), Script::default()),
            ],
            ..Default::default()
        };
        assert!(tx.is_coinstake());
        assert!(!tx.is_coinbase());
    }

    #[test]
    fn spending_tx_is_neither() {
        let tx = Transaction {
            vin: vec![TxIn::new(Outpoint::new(Hash256::new([1; 32]), 0))],
            vout: vec![TxOut::new(Amount::from_coins(1), Script::default())],
            ..Default::default()
        };
        assert!(!tx.is_coinbase());
        assert!(!tx.is_coinstake());
    }
}
