//! The governance engine.
//!
//! Owns the indexed state and applies blocks forward and backward. The
//! engine registers as a validation listener with the node; every block the
//! node connects or disconnects flows through here. Extraction runs outside
//! the state lock, and the lock is released around calls into the node's
//! UTXO and mempool views so it is never held across the chain lock.

use crate::extractor::{extract_from_block, ProposalSource};
use crate::proposal::Proposal;
use crate::state::GovernanceState;
use crate::superblock::{inside_vote_cutoff, next_superblock};
use crate::vote::{Vote, VoteType};
use meridian_chain::{BlockIndex, MempoolView, TxProvider, UtxoView, ValidationEvents};
use meridian_crypto::hash_transaction;
use meridian_types::{Block, ConsensusParams, Hash256, Outpoint};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// The on-chain governance engine.
pub struct Governance {
    params: ConsensusParams,
    state: Mutex<GovernanceState>,
    tx_provider: Arc<dyn TxProvider + Send + Sync>,
    utxo_view: Arc<dyn UtxoView + Send + Sync>,
    mempool: Arc<dyn MempoolView + Send + Sync>,
}

impl Governance {
    pub fn new(
        params: ConsensusParams,
        tx_provider: Arc<dyn TxProvider + Send + Sync>,
        utxo_view: Arc<dyn UtxoView + Send + Sync>,
        mempool: Arc<dyn MempoolView + Send + Sync>,
    ) -> Self {
        Self {
            params,
            state: Mutex::new(GovernanceState::default()),
            tx_provider,
            utxo_view,
            mempool,
        }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, GovernanceState> {
        self.state.lock().expect("governance state lock poisoned")
    }

    pub(crate) fn tx_provider(&self) -> &(dyn TxProvider + Send + Sync) {
        &*self.tx_provider
    }

    /// Drop all indexed state.
    pub fn reset(&self) {
        self.lock().clear();
    }

    // ── Queries ──────────────────────────────────────────────────────────
    //
    // All queries take the lock for the duration of a point lookup or
    // snapshot copy; callers always receive value copies.

    pub fn has_proposal(&self, hash: &Hash256) -> bool {
        self.lock().has_proposal(hash)
    }

    /// True if the proposal exists and was first seen strictly before
    /// `height`.
    pub fn has_proposal_before(&self, hash: &Hash256, height: i32) -> bool {
        self.lock().has_proposal_before(hash, height)
    }

    /// True if a proposal with this name is scheduled for the superblock.
    pub fn has_proposal_by_name(&self, name: &str, superblock: i32) -> bool {
        self.lock()
            .proposals()
            .any(|p| p.superblock == superblock && p.name == name)
    }

    pub fn get_proposal(&self, hash: &Hash256) -> Option<Proposal> {
        self.lock().proposal(hash).cloned()
    }

    pub fn get_proposals(&self) -> Vec<Proposal> {
        self.lock().proposals().cloned().collect()
    }

    pub fn proposals_for_superblock(&self, superblock: i32) -> Vec<Proposal> {
        self.lock()
            .proposals()
            .filter(|p| p.superblock == superblock)
            .cloned()
            .collect()
    }

    /// Proposals whose superblock is at or after the given height.
    pub fn proposals_since(&self, height: i32) -> Vec<Proposal> {
        self.lock().proposals_since(height)
    }

    pub fn copy_proposals(&self) -> HashMap<Hash256, Proposal> {
        self.lock().copy_proposals()
    }

    pub fn has_vote(&self, hash: &Hash256) -> bool {
        self.lock().vote(hash).is_some()
    }

    /// True if a vote with this answer on this UTXO exists for the proposal.
    pub fn has_vote_for(&self, proposal: &Hash256, vote_type: VoteType, utxo: &Outpoint) -> bool {
        let state = self.lock();
        let Some(superblock) = state.proposal(proposal).map(|p| p.superblock) else {
            return false;
        };
        let Some(bucket) = state.superblock_votes(superblock) else {
            return false;
        };
        bucket
            .values()
            .any(|v| v.utxo == *utxo && v.proposal == *proposal && v.vote == vote_type)
    }

    pub fn get_vote(&self, hash: &Hash256) -> Option<Vote> {
        self.lock().vote(hash).cloned()
    }

    /// All unspent votes.
    pub fn get_votes(&self) -> Vec<Vote> {
        self.lock()
            .votes()
            .filter(|v| !v.is_spent())
            .cloned()
            .collect()
    }

    /// All unspent votes for a proposal.
    pub fn votes_for_proposal(&self, proposal: &Hash256) -> Vec<Vote> {
        let state = self.lock();
        let Some(superblock) = state.proposal(proposal).map(|p| p.superblock) else {
            return Vec::new();
        };
        let Some(bucket) = state.superblock_votes(superblock) else {
            return Vec::new();
        };
        bucket
            .values()
            .filter(|v| v.proposal == *proposal && !v.is_spent())
            .cloned()
            .collect()
    }

    /// All unspent votes in a superblock.
    pub fn votes_for_superblock(&self, superblock: i32) -> Vec<Vote> {
        let state = self.lock();
        let Some(bucket) = state.superblock_votes(superblock) else {
            return Vec::new();
        };
        bucket
            .values()
            .filter(|v| !v.is_spent())
            .cloned()
            .collect()
    }

    pub fn copy_votes(&self) -> HashMap<Hash256, Vote> {
        self.lock().copy_votes()
    }

    /// The proposals scheduled for a superblock together with their
    /// (unspent) votes.
    pub fn proposals_and_votes_for_superblock(
        &self,
        superblock: i32,
    ) -> (Vec<Proposal>, Vec<Vote>) {
        let proposals = self.proposals_for_superblock(superblock);
        let hashes: Vec<Hash256> = proposals.iter().map(|p| p.hash()).collect();
        let votes = self
            .votes_for_superblock(superblock)
            .into_iter()
            .filter(|v| hashes.contains(&v.proposal))
            .collect();
        (proposals, votes)
    }

    /// The first superblock strictly after `from_height`.
    pub fn next_superblock(&self, from_height: i32) -> i32 {
        next_superblock(&self.params, from_height)
    }

    /// The superblock at or immediately before `from_height`.
    pub fn previous_superblock(&self, from_height: i32) -> i32 {
        crate::superblock::previous_superblock(&self.params, from_height)
    }

    pub fn is_superblock(&self, height: i32) -> bool {
        crate::superblock::is_superblock(height, &self.params)
    }

    /// True if `utxo` backs a vote on a proposal whose voting period has
    /// ended (the frozen window immediately before the next superblock).
    /// Wallets use this to avoid spending a UTXO that would void its vote.
    pub fn utxo_in_vote_cutoff(&self, utxo: &Outpoint, tip_height: i32) -> bool {
        let superblock = next_superblock(&self.params, tip_height);
        if !inside_vote_cutoff(superblock, tip_height, &self.params) {
            return false;
        }
        let (_, votes) = self.proposals_and_votes_for_superblock(superblock);
        votes.iter().any(|v| v.utxo == *utxo)
    }

    // ── Block application ────────────────────────────────────────────────

    /// Apply one block's governance records to the index.
    ///
    /// With `processing_chain_tip` (the steady-state path) votes must
    /// reference an already-indexed proposal and their UTXOs must still be
    /// unspent. The historical loader disables both checks and reconciles
    /// afterwards.
    pub fn process_block(&self, block: &Block, index: &BlockIndex, processing_chain_tip: bool) {
        let records = extract_from_block(
            block,
            Some(index),
            self,
            &*self.tx_provider,
            &self.params,
            processing_chain_tip,
        );

        {
            let mut state = self.lock();
            // Proposals first: vote insertion derives the superblock from
            // the proposal.
            for proposal in records.proposals {
                state.add_proposal(proposal);
            }

            for vote in records.votes {
                if processing_chain_tip && !state.has_proposal(&vote.proposal) {
                    continue;
                }
                let hash = vote.hash();
                let is_change = match state.vote(&hash) {
                    Some(existing) => {
                        // Vote-change rule: strictly newer time wins; equal
                        // times fall back to the greater signature hash.
                        // Total order shared with the extractor's
                        // intra-block rule.
                        let newer = vote.time > existing.time
                            || (vote.time == existing.time
                                && vote.sig_hash() > existing.sig_hash());
                        if !newer {
                            continue;
                        }
                        true
                    }
                    None => false,
                };

                if !is_change && processing_chain_tip {
                    // The spent check calls into the node's views; never
                    // hold our lock across that boundary.
                    drop(state);
                    let spent = self.is_vote_spent(&vote);
                    state = self.lock();
                    if spent {
                        debug!(utxo = %vote.utxo, "dropping vote with spent utxo");
                        continue;
                    }
                }

                if !state.add_vote(vote.clone()) {
                    state.add_orphan_vote(vote);
                }
            }

            if !processing_chain_tip {
                return;
            }
        }

        // Mark votes whose UTXOs this block spent, bounded by each
        // proposal's superblock.
        let prevouts = block_prevouts(block);
        let mut state = self.lock();
        let mut to_spend: Vec<(Hash256, Hash256)> = Vec::new();
        for proposal in state.proposals_since(index.height) {
            let proposal_hash = proposal.hash();
            if let Some(bucket) = state.superblock_votes(proposal.superblock) {
                for (hash, vote) in bucket {
                    if vote.proposal == proposal_hash && !vote.is_spent() {
                        if let Some(txid) = prevouts.get(&vote.utxo) {
                            to_spend.push((*hash, *txid));
                        }
                    }
                }
            }
        }
        for (hash, txid) in to_spend {
            state.spend_vote(&hash, index.height, txid);
        }
    }

    /// Reverse one block's governance effects.
    fn disconnect_block(&self, block: &Block, index: &BlockIndex) {
        // Cutoff checks are disabled: these records were already
        // consensus-accepted when the block connected.
        let records = extract_from_block(
            block,
            None,
            self,
            &*self.tx_provider,
            &self.params,
            false,
        );

        {
            let mut state = self.lock();
            // Votes first: vote removal reads the proposal.
            for vote in &records.votes {
                let hash = vote.hash();
                if state
                    .vote(&hash)
                    .is_some_and(|stored| stored.block_number == index.height)
                {
                    state.remove_vote(&hash);
                }
            }
            for proposal in &records.proposals {
                let hash = proposal.hash();
                if state
                    .proposal(&hash)
                    .is_some_and(|stored| stored.block_number == index.height)
                {
                    state.remove_proposal(&hash);
                }
            }
        }

        // Clear spent markers set by this block, but only where the marker
        // matches this block and spending tx exactly.
        let prevouts = block_prevouts(block);
        let mut state = self.lock();
        let mut to_unspend: Vec<(Hash256, Hash256)> = Vec::new();
        for proposal in state.proposals_since(index.height) {
            let proposal_hash = proposal.hash();
            if let Some(bucket) = state.superblock_votes(proposal.superblock) {
                for (hash, vote) in bucket {
                    if vote.proposal == proposal_hash {
                        if let Some(txid) = prevouts.get(&vote.utxo) {
                            to_unspend.push((*hash, *txid));
                        }
                    }
                }
            }
        }
        for (hash, txid) in to_unspend {
            state.unspend_vote(&hash, index.height, txid);
        }
    }

    fn is_vote_spent(&self, vote: &Vote) -> bool {
        self.utxo_view.get_coin(&vote.utxo).is_none() || self.mempool.is_spent(&vote.utxo)
    }
}

impl ProposalSource for Governance {
    fn proposal(&self, hash: &Hash256) -> Option<Proposal> {
        self.lock().proposal(hash).cloned()
    }

    fn has_proposal_before(&self, hash: &Hash256, height: i32) -> bool {
        self.lock().has_proposal_before(hash, height)
    }
}

impl ValidationEvents for Governance {
    fn on_block_connected(&self, block: &Block, index: &BlockIndex) {
        self.process_block(block, index, true);
    }

    fn on_block_disconnected(&self, block: &Block, index: &BlockIndex) {
        self.disconnect_block(block, index);
    }
}

/// Every prevout spent by the block, mapped to its spending txid.
fn block_prevouts(block: &Block) -> HashMap<Outpoint, Hash256> {
    let mut prevouts = HashMap::new();
    for tx in &block.vtx {
        let txid = hash_transaction(tx);
        for vin in &tx.vin {
            if !vin.prevout.is_null() {
                prevouts.insert(vin.prevout, txid);
            }
        }
    }
    prevouts
}
