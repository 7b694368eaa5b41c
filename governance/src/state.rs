//! The indexed governance state.
//!
//! Three correlated maps: proposals by hash, votes by hash, and votes
//! bucketed by superblock. The superblock bucket mirrors the vote map; the
//! mirror is maintained by value, with every mutation re-deriving the
//! superblock from the vote's proposal so the two maps never reference
//! each other.

use crate::proposal::Proposal;
use crate::vote::Vote;
use meridian_types::Hash256;
use std::collections::HashMap;

#[derive(Default)]
pub struct GovernanceState {
    proposals: HashMap<Hash256, Proposal>,
    votes: HashMap<Hash256, Vote>,
    sbvotes: HashMap<i32, HashMap<Hash256, Vote>>,
}

impl GovernanceState {
    pub fn clear(&mut self) {
        self.proposals.clear();
        self.votes.clear();
        self.sbvotes.clear();
    }

    pub fn proposal(&self, hash: &Hash256) -> Option<&Proposal> {
        self.proposals.get(hash)
    }

    pub fn has_proposal(&self, hash: &Hash256) -> bool {
        self.proposals.contains_key(hash)
    }

    pub fn has_proposal_before(&self, hash: &Hash256, height: i32) -> bool {
        self.proposals
            .get(hash)
            .is_some_and(|p| p.block_number < height)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Proposals whose superblock is at or after the given height.
    pub fn proposals_since(&self, height: i32) -> Vec<Proposal> {
        self.proposals
            .values()
            .filter(|p| p.superblock >= height)
            .cloned()
            .collect()
    }

    pub fn vote(&self, hash: &Hash256) -> Option<&Vote> {
        self.votes.get(hash)
    }

    pub fn votes(&self) -> impl Iterator<Item = &Vote> {
        self.votes.values()
    }

    pub fn superblock_votes(&self, superblock: i32) -> Option<&HashMap<Hash256, Vote>> {
        self.sbvotes.get(&superblock)
    }

    /// Insert a proposal. First sighting wins: an existing proposal is
    /// never overwritten.
    pub fn add_proposal(&mut self, proposal: Proposal) {
        self.proposals.entry(proposal.hash()).or_insert(proposal);
    }

    pub fn remove_proposal(&mut self, hash: &Hash256) {
        self.proposals.remove(hash);
    }

    /// Insert or overwrite a vote in both maps. Requires the vote's
    /// proposal to be indexed (the superblock bucket is derived from it);
    /// returns false otherwise.
    pub fn add_vote(&mut self, vote: Vote) -> bool {
        let Some(proposal) = self.proposals.get(&vote.proposal) else {
            return false;
        };
        let superblock = proposal.superblock;
        let hash = vote.hash();
        self.sbvotes
            .entry(superblock)
            .or_default()
            .insert(hash, vote.clone());
        self.votes.insert(hash, vote);
        true
    }

    /// Insert a vote whose proposal is not yet indexed. Only the vote map
    /// is updated; the historical loader's reconcile pass either completes
    /// the mirror or removes the vote once the proposal's fate is known.
    pub fn add_orphan_vote(&mut self, vote: Vote) {
        self.votes.insert(vote.hash(), vote);
    }

    /// Remove a vote from both maps.
    pub fn remove_vote(&mut self, hash: &Hash256) {
        let Some(vote) = self.votes.remove(hash) else {
            return;
        };
        let Some(proposal) = self.proposals.get(&vote.proposal) else {
            return;
        };
        if let Some(bucket) = self.sbvotes.get_mut(&proposal.superblock) {
            bucket.remove(hash);
        }
    }

    /// Mark a vote's UTXO spent, in both maps. A vote is never spent by a
    /// block after its proposal's superblock.
    pub fn spend_vote(&mut self, hash: &Hash256, block: i32, txhash: Hash256) {
        let Some(superblock) = self
            .votes
            .get(hash)
            .and_then(|v| self.proposals.get(&v.proposal))
            .map(|p| p.superblock)
        else {
            return;
        };
        if block > superblock {
            return;
        }
        if let Some(vote) = self.votes.get_mut(hash) {
            vote.spend(block, txhash);
        }
        if let Some(vote) = self
            .sbvotes
            .get_mut(&superblock)
            .and_then(|bucket| bucket.get_mut(hash))
        {
            vote.spend(block, txhash);
        }
    }

    /// Clear a vote's spent marker, in both maps, iff the marker matches
    /// the given block and spending tx exactly.
    pub fn unspend_vote(&mut self, hash: &Hash256, block: i32, txhash: Hash256) {
        let Some(superblock) = self
            .votes
            .get(hash)
            .and_then(|v| self.proposals.get(&v.proposal))
            .map(|p| p.superblock)
        else {
            return;
        };
        if block > superblock {
            return;
        }
        if let Some(vote) = self.votes.get_mut(hash) {
            vote.unspend(block, txhash);
        }
        if let Some(vote) = self
            .sbvotes
            .get_mut(&superblock)
            .and_then(|bucket| bucket.get_mut(hash))
        {
            vote.unspend(block, txhash);
        }
    }

    pub fn copy_proposals(&self) -> HashMap<Hash256, Proposal> {
        self.proposals.clone()
    }

    pub fn copy_votes(&self) -> HashMap<Hash256, Vote> {
        self.votes.clone()
    }

    /// Check the mirror invariant: every vote with an indexed proposal has
    /// an identical twin in its superblock bucket, and buckets hold nothing
    /// else. Test support.
    #[doc(hidden)]
    pub fn mirror_consistent(&self) -> bool {
        let mut with_proposal = 0usize;
        for (hash, vote) in &self.votes {
            if let Some(proposal) = self.proposals.get(&vote.proposal) {
                with_proposal += 1;
                let twin = self
                    .sbvotes
                    .get(&proposal.superblock)
                    .and_then(|bucket| bucket.get(hash));
                if twin != Some(vote) {
                    return false;
                }
            }
        }
        let mirrored: usize = self.sbvotes.values().map(|bucket| bucket.len()).sum();
        mirrored == with_proposal
    }
}
