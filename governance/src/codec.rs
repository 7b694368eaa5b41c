//! Governance record envelope and data-carrier script handling.
//!
//! A governance record is the first non-empty data push of an `OP_RETURN`
//! output. Its first two bytes — version and record type — form the envelope
//! that tells the extractor how to parse the rest.

use meridian_types::{Cursor, DecodeError, Script};

/// Version tag every record must carry. Records with any other version are
/// ignored entirely.
pub const NETWORK_VERSION: u8 = 0x01;

/// Maximum serialized size of a data-carrier output script.
pub const MAX_OP_RETURN_RELAY: usize = 160;

/// Maximum serialized size of a record: the relay limit minus the
/// `OP_RETURN` opcode and pushdata bytes.
pub const MAX_RECORD_SIZE: usize = MAX_OP_RETURN_RELAY - 3;

/// Characters available to proposal authors across the user-defined fields
/// once fixed-width fields and length prefixes are accounted for.
pub const PROPOSAL_USERDEFINED_LIMIT: usize = 139;

/// Record discriminants carried in the envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    None = 0,
    Proposal = 1,
    Vote = 2,
}

impl RecordType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::Proposal),
            2 => Some(Self::Vote),
            _ => None,
        }
    }
}

/// The two-byte record envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub version: u8,
    pub record_type: u8,
}

impl Envelope {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = Cursor::new(payload);
        Ok(Self {
            version: cur.get_u8()?,
            record_type: cur.get_u8()?,
        })
    }

    /// The envelope parses further only under the current network version.
    pub fn is_valid(&self) -> bool {
        self.version == NETWORK_VERSION
    }
}

/// Extract the governance payload from an output script: the first non-empty
/// pushed data blob of an `OP_RETURN` script. Returns `None` for any other
/// script shape.
pub fn governance_payload(script: &Script) -> Option<&[u8]> {
    if !script.is_op_return() {
        return None;
    }
    script
        .ops()
        .map(|op| op.data)
        .find(|data| !data.is_empty())
}
