//! On-chain treasury governance for the Meridian protocol.
//!
//! Proposals and votes ride in unspendable transaction outputs. The engine
//! scans confirmed blocks for these records, validates them under the
//! consensus rules, keeps an indexed in-memory view across reorgs, tallies
//! votes per superblock, and decides which proposals the superblock's
//! coinstake must pay.
//!
//! The engine owns no chain state of its own: everything it knows is
//! re-derived from the chain, either incrementally through the validation
//! callbacks or in bulk by the parallel startup loader.

pub mod codec;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod payout;
pub mod proposal;
pub mod state;
pub mod superblock;
pub mod tally;
pub mod vote;

pub use codec::{RecordType, NETWORK_VERSION};
pub use engine::Governance;
pub use error::GovernanceError;
pub use extractor::{extract_from_block, BlockRecords, ProposalSource};
pub use proposal::{Proposal, ProposalError};
pub use superblock::{
    inside_vote_cutoff, is_superblock, next_superblock, outside_proposal_cutoff,
    outside_voting_cutoff, previous_superblock,
};
pub use tally::{tally_votes, Tally};
pub use vote::{vin_hash, vote_in_txout, VinHash, Vote, VoteError, VoteType};
