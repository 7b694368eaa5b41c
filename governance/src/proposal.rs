//! Treasury proposals.
//!
//! A proposal asks for a payout from a specific superblock. Anyone can
//! submit one by embedding it in a transaction output; it becomes part of
//! governance state once the carrying block confirms before the proposal
//! cutoff.

use crate::codec::{RecordType, MAX_RECORD_SIZE, NETWORK_VERSION};
use meridian_crypto::hash256;
use meridian_types::encode::{put_i32_le, put_i64_le, put_u8, put_var_string};
use meridian_types::{Amount, ConsensusParams, Cursor, DecodeError, Encodable, Hash256};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Why a proposal failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProposalError {
    #[error("proposal name {0:?} is invalid, only alphanumeric characters are accepted")]
    BadName(String),

    #[error("bad superblock {0}, not on the superblock interval")]
    BadSuperblock(i32),

    #[error("bad proposal amount {amount}, specify an amount between {min} and {max}")]
    BadAmount {
        amount: Amount,
        min: Amount,
        max: Amount,
    },

    #[error("bad payment address {0}")]
    BadAddress(String),

    #[error("bad proposal type, expected {}", RecordType::Proposal as u8)]
    BadType(u8),

    #[error("bad proposal network version, expected {NETWORK_VERSION}")]
    BadVersion(u8),

    #[error("proposal is too long by {0} bytes, reduce the description")]
    TooLarge(usize),
}

/// A treasury proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub version: u8,
    pub record_type: u8,
    /// The superblock this proposal requests payment from.
    pub superblock: i32,
    /// Requested payout.
    pub amount: Amount,
    /// Payout address.
    pub address: String,
    pub name: String,
    pub url: String,
    pub description: String,
    /// Height of the block this proposal was first seen in. Derived, never
    /// serialized.
    pub block_number: i32,
}

impl Proposal {
    pub fn new(
        name: impl Into<String>,
        superblock: i32,
        amount: Amount,
        address: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            version: NETWORK_VERSION,
            record_type: RecordType::Proposal as u8,
            superblock,
            amount,
            address: address.into(),
            name: name.into(),
            url: url.into(),
            description: description.into(),
            block_number: 0,
        }
    }

    /// A default-constructed proposal has no superblock.
    pub fn is_null(&self) -> bool {
        self.superblock == 0
    }

    /// The proposal's identity: the hash of its serialized fields.
    pub fn hash(&self) -> Hash256 {
        hash256(&self.encode())
    }

    pub fn decode(cur: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            version: cur.get_u8()?,
            record_type: cur.get_u8()?,
            superblock: cur.get_i32_le()?,
            amount: Amount::new(cur.get_i64_le()?),
            address: cur.get_var_string()?,
            name: cur.get_var_string()?,
            url: cur.get_var_string()?,
            description: cur.get_var_string()?,
            block_number: 0,
        })
    }

    /// Validate the proposal against consensus policy.
    pub fn validate(&self, params: &ConsensusParams) -> Result<(), ProposalError> {
        if !valid_name(&self.name) {
            return Err(ProposalError::BadName(self.name.clone()));
        }
        if self.superblock % params.superblock_interval != 0 {
            return Err(ProposalError::BadSuperblock(self.superblock));
        }
        let max = params
            .proposal_max_amount
            .min(params.block_subsidy(self.superblock));
        if self.amount < params.proposal_min_amount || self.amount > max {
            return Err(ProposalError::BadAmount {
                amount: self.amount,
                min: params.proposal_min_amount,
                max,
            });
        }
        if !meridian_crypto::validate_address(&self.address) {
            return Err(ProposalError::BadAddress(self.address.clone()));
        }
        if self.record_type != RecordType::Proposal as u8 {
            return Err(ProposalError::BadType(self.record_type));
        }
        if self.version != NETWORK_VERSION {
            return Err(ProposalError::BadVersion(self.version));
        }
        let size = self.encode().len();
        if size > MAX_RECORD_SIZE {
            return Err(ProposalError::TooLarge(size - MAX_RECORD_SIZE));
        }
        Ok(())
    }
}

impl Encodable for Proposal {
    fn encode_to(&self, out: &mut Vec<u8>) {
        put_u8(out, self.version);
        put_u8(out, self.record_type);
        put_i32_le(out, self.superblock);
        put_i64_le(out, self.amount.units());
        put_var_string(out, &self.address);
        put_var_string(out, &self.name);
        put_var_string(out, &self.url);
        put_var_string(out, &self.description);
    }
}

// Identity is the record hash; the derived block number does not participate.
impl PartialEq for Proposal {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Proposal {}

impl Ord for Proposal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash().cmp(&other.hash())
    }
}

impl PartialOrd for Proposal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Proposal names match `^\w+[\w\-_ ]*\w+$`: word characters at both ends,
/// with dashes, underscores, and spaces allowed between.
fn valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    let word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    if !word(bytes[0]) || !word(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes
        .iter()
        .all(|&b| word(b) || b == b'-' || b == b' ')
}
