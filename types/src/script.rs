//! The script fragment the governance engine understands.
//!
//! Meridian scripts are full Bitcoin-style scripts, but the engine only ever
//! builds and inspects two shapes: unspendable data-carrier outputs
//! (`OP_RETURN <push>`) and standard single-key payout outputs
//! (`OP_DUP OP_HASH160 <keyid> OP_EQUALVERIFY OP_CHECKSIG`).

use crate::keys::KeyId;
use serde::{Deserialize, Serialize};

pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// A serialized output script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script(pub Vec<u8>);

/// One decoded script operation: the opcode and any pushed data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptOp<'a> {
    pub opcode: u8,
    pub data: &'a [u8],
}

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the script starts with the unspendable-output opcode.
    pub fn is_op_return(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// Build an unspendable data-carrier script: `OP_RETURN <payload>`.
    pub fn op_return(payload: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(payload.len() + 3);
        bytes.push(OP_RETURN);
        push_data(&mut bytes, payload);
        Self(bytes)
    }

    /// Build the standard single-key payout script for `keyid`.
    pub fn pay_to_key_hash(keyid: &KeyId) -> Self {
        let mut bytes = Vec::with_capacity(25);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
        bytes.extend_from_slice(keyid.as_bytes());
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(bytes)
    }

    /// If this is a standard single-key payout script, return its key id.
    pub fn extract_destination(&self) -> Option<KeyId> {
        let b = &self.0;
        if b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == 20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
        {
            let mut keyid = [0u8; 20];
            keyid.copy_from_slice(&b[3..23]);
            return Some(KeyId(keyid));
        }
        None
    }

    /// Iterate over the script's operations, stopping at the first
    /// malformed opcode.
    pub fn ops(&self) -> ScriptOps<'_> {
        ScriptOps {
            bytes: &self.0,
            pos: 0,
        }
    }
}

/// Append a minimal push of `data` to a script buffer.
fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len < OP_PUSHDATA1 as usize {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(OP_PUSHDATA1);
        out.push(len as u8);
    } else if len <= 0xffff {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
}

/// Iterator over script operations.
pub struct ScriptOps<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for ScriptOps<'a> {
    type Item = ScriptOp<'a>;

    fn next(&mut self) -> Option<ScriptOp<'a>> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let opcode = self.bytes[self.pos];
        self.pos += 1;

        let len = match opcode {
            0x01..=0x4b => opcode as usize,
            OP_PUSHDATA1 => {
                let n = *self.bytes.get(self.pos)? as usize;
                self.pos += 1;
                n
            }
            OP_PUSHDATA2 => {
                let raw = self.bytes.get(self.pos..self.pos + 2)?;
                self.pos += 2;
                u16::from_le_bytes(raw.try_into().unwrap()) as usize
            }
            OP_PUSHDATA4 => {
                let raw = self.bytes.get(self.pos..self.pos + 4)?;
                self.pos += 4;
                u32::from_le_bytes(raw.try_into().unwrap()) as usize
            }
            _ => return Some(ScriptOp { opcode, data: &[] }),
        };

        let data = self.bytes.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(ScriptOp { opcode, data })
    }
}
