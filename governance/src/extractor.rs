//! Governance record extraction from blocks.
//!
//! Walks a block's transactions, finds data-carrier outputs, decodes and
//! validates the records, and applies the cutoff windows. All record-level
//! failures are silent: an invalid record simply never existed.

use crate::codec::{governance_payload, Envelope, RecordType};
use crate::proposal::Proposal;
use crate::superblock::{outside_proposal_cutoff, outside_voting_cutoff};
use crate::vote::{vin_hash, VinHash, Vote};
use meridian_chain::{BlockIndex, TxProvider};
use meridian_crypto::hash_transaction;
use meridian_types::{Block, ConsensusParams, Cursor, Hash256, Outpoint};
use std::collections::{btree_map::Entry, BTreeMap, HashSet};
use tracing::debug;

/// Lookup of already-indexed proposals, needed for the voting cutoff and
/// the proposal-must-precede-vote rule.
pub trait ProposalSource {
    fn proposal(&self, hash: &Hash256) -> Option<Proposal>;

    /// True if the proposal exists and was first seen strictly before
    /// `height`.
    fn has_proposal_before(&self, hash: &Hash256, height: i32) -> bool;
}

/// Proposals and votes extracted from one block, deduplicated by identity.
#[derive(Debug, Default)]
pub struct BlockRecords {
    pub proposals: Vec<Proposal>,
    pub votes: Vec<Vote>,
}

/// Extract all governance records from a block.
///
/// With a block index the cutoff windows apply and records are stamped with
/// the block's height; without one (disconnect handling) both are skipped
/// because the records were already consensus-accepted.
///
/// With `check_proposal_exists` (normal chain-tip processing) a vote is kept
/// only if its proposal is already indexed from an earlier block. The
/// historical loader disables the check since a vote's proposal may be
/// extracted by a different shard.
pub fn extract_from_block(
    block: &Block,
    block_index: Option<&BlockIndex>,
    proposals: &dyn ProposalSource,
    tx_provider: &dyn TxProvider,
    params: &ConsensusParams,
    check_proposal_exists: bool,
) -> BlockRecords {
    let height = block_index.map(|index| index.height).unwrap_or(0);
    let mut out_proposals: BTreeMap<Hash256, Proposal> = BTreeMap::new();
    let mut out_votes: BTreeMap<Hash256, Vote> = BTreeMap::new();

    for tx in &block.vtx {
        if tx.is_coinbase() {
            continue;
        }
        // Computed on the first vote found in this transaction.
        let mut txid: Option<Hash256> = None;
        let mut vin_hashes: Option<HashSet<VinHash>> = None;

        for (n, txout) in tx.vout.iter().enumerate() {
            let Some(payload) = governance_payload(&txout.script_pubkey) else {
                continue;
            };
            let Ok(envelope) = Envelope::decode(payload) else {
                continue;
            };
            if !envelope.is_valid() {
                continue;
            }

            match RecordType::from_u8(envelope.record_type) {
                Some(RecordType::Proposal) => {
                    let mut cur = Cursor::new(payload);
                    let Ok(mut proposal) = Proposal::decode(&mut cur) else {
                        continue;
                    };
                    proposal.block_number = height;
                    if let Err(err) = proposal.validate(params) {
                        debug!(height, %err, "dropping invalid proposal");
                        continue;
                    }
                    if let Some(index) = block_index {
                        if !outside_proposal_cutoff(&proposal, index.height, params) {
                            debug!(height, superblock = proposal.superblock,
                                   "dropping proposal inside cutoff");
                            continue;
                        }
                    }
                    out_proposals.entry(proposal.hash()).or_insert(proposal);
                }
                Some(RecordType::Vote) => {
                    let txid = *txid.get_or_insert_with(|| hash_transaction(tx));
                    let hashes = vin_hashes.get_or_insert_with(|| {
                        tx.vin.iter().map(|vin| vin_hash(&vin.prevout)).collect()
                    });

                    let mut cur = Cursor::new(payload);
                    let Ok(mut vote) = Vote::decode(&mut cur) else {
                        continue;
                    };
                    vote.outpoint = Outpoint::new(txid, n as u32);
                    vote.time = block.time;
                    vote.block_number = height;
                    vote.resolve_utxo(tx_provider);

                    if let Some(index) = block_index {
                        if check_proposal_exists
                            && !proposals.has_proposal_before(&vote.proposal, index.height)
                        {
                            debug!(height, "dropping vote for unknown proposal");
                            continue;
                        }
                        // The cutoff needs the proposal's superblock. An
                        // unknown proposal here can only happen during the
                        // historical load, where the reconcile pass settles
                        // the vote's fate.
                        if let Some(proposal) = proposals.proposal(&vote.proposal) {
                            if !outside_voting_cutoff(&proposal, index.height, params) {
                                debug!(height, "dropping vote inside cutoff");
                                continue;
                            }
                        }
                    }
                    if let Err(err) = vote.validate_in_tx(hashes, params) {
                        debug!(height, %err, "dropping invalid vote");
                        continue;
                    }

                    // A changed answer in the same block: the numerically
                    // greater signature hash wins, mirroring the cross-block
                    // integration rule.
                    match out_votes.entry(vote.hash()) {
                        Entry::Occupied(mut existing) => {
                            if vote.sig_hash() > existing.get().sig_hash() {
                                existing.insert(vote);
                            }
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(vote);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    BlockRecords {
        proposals: out_proposals.into_values().collect(),
        votes: out_votes.into_values().collect(),
    }
}
