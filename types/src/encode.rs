//! Consensus byte encoding.
//!
//! The on-chain formats are bit-exact: multi-byte integers are little-endian
//! and variable-length fields carry a compact-size prefix (1, 3, 5, or 9
//! bytes). Encoding writes into a `Vec<u8>`; decoding reads through a
//! [`Cursor`] that tracks its offset and fails on truncated input.

use crate::hash::Hash256;
use crate::outpoint::Outpoint;
use thiserror::Error;

/// Failure while decoding consensus bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEnd(usize),

    #[error("non-canonical compact size")]
    NonCanonicalSize,

    #[error("declared size {0} exceeds remaining input")]
    Oversize(u64),

    #[error("invalid utf-8 in string field")]
    BadUtf8,

    #[error("invalid field value: {0}")]
    InvalidValue(&'static str),
}

/// Types with a canonical consensus encoding.
pub trait Encodable {
    fn encode_to(&self, out: &mut Vec<u8>);

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }
}

pub fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub fn put_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn put_i32_le(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn put_i64_le(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Write a compact-size length prefix.
pub fn put_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Write a compact-size-prefixed byte string.
pub fn put_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    put_compact_size(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// Write a compact-size-prefixed UTF-8 string.
pub fn put_var_string(out: &mut Vec<u8>, s: &str) {
    put_var_bytes(out, s.as_bytes());
}

impl Encodable for Hash256 {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Encodable for Outpoint {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.txid.encode_to(out);
        put_u32_le(out, self.vout);
    }
}

/// A reading cursor over consensus bytes.
pub struct Cursor<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEnd(self.offset));
        }
        let slice = &self.input[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn get_i32_le(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn get_i64_le(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn get_compact_size(&mut self) -> Result<u64, DecodeError> {
        let head = self.get_u8()?;
        let n = match head {
            0xfd => u16::from_le_bytes(self.take(2)?.try_into().unwrap()) as u64,
            0xfe => u32::from_le_bytes(self.take(4)?.try_into().unwrap()) as u64,
            0xff => u64::from_le_bytes(self.take(8)?.try_into().unwrap()),
            n => return Ok(n as u64),
        };
        // Reject paddable encodings so every length has exactly one form.
        let canonical = match head {
            0xfd => n >= 0xfd,
            0xfe => n > 0xffff,
            _ => n > 0xffff_ffff,
        };
        if !canonical {
            return Err(DecodeError::NonCanonicalSize);
        }
        Ok(n)
    }

    pub fn get_var_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.get_compact_size()?;
        if len > self.remaining() as u64 {
            return Err(DecodeError::Oversize(len));
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    pub fn get_var_string(&mut self) -> Result<String, DecodeError> {
        let bytes = self.get_var_bytes()?;
        String::from_utf8(bytes).map_err(|_| DecodeError::BadUtf8)
    }

    pub fn get_hash256(&mut self) -> Result<Hash256, DecodeError> {
        Ok(Hash256::new(self.take(32)?.try_into().unwrap()))
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        Ok(self.take(N)?.try_into().unwrap())
    }

    pub fn get_outpoint(&mut self) -> Result<Outpoint, DecodeError> {
        let txid = self.get_hash256()?;
        let vout = self.get_u32_le()?;
        Ok(Outpoint { txid, vout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_size_roundtrip() {
        for n in [0u64, 1, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 1 << 40] {
            let mut out = Vec::new();
            put_compact_size(&mut out, n);
            let mut cur = Cursor::new(&out);
            assert_eq!(cur.get_compact_size().unwrap(), n);
            assert!(cur.is_empty());
        }
    }

    #[test]
    fn compact_size_rejects_padded_form() {
        // 5 encoded with a 3-byte form instead of a single byte.
        let bytes = [0xfd, 0x05, 0x00];
        let mut cur = Cursor::new(&bytes);
        assert_eq!(
            cur.get_compact_size().unwrap_err(),
            DecodeError::NonCanonicalSize
        );
    }

    #[test]
    fn var_string_roundtrip() {
        let mut out = Vec::new();
        put_var_string(&mut out, "network upgrade fund");
        let mut cur = Cursor::new(&out);
        assert_eq!(cur.get_var_string().unwrap(), "network upgrade fund");
    }

    #[test]
    fn truncated_input_fails() {
        let mut out = Vec::new();
        put_var_bytes(&mut out, &[1, 2, 3, 4]);
        let mut cur = Cursor::new(&out[..3]);
        assert!(cur.get_var_bytes().is_err());
    }

    #[test]
    fn outpoint_roundtrip() {
        let op = Outpoint::new(Hash256::new([9u8; 32]), 7);
        let bytes = op.encode();
        assert_eq!(bytes.len(), 36);
        let mut cur = Cursor::new(&bytes);
        assert_eq!(cur.get_outpoint().unwrap(), op);
    }
}
