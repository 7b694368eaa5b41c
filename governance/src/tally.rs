//! Vote tallying, quorum, and payee selection.

use crate::engine::Governance;
use crate::proposal::Proposal;
use crate::superblock::is_superblock;
use crate::vote::{Vote, VoteType};
use meridian_crypto::script_for_address;
use meridian_types::{Amount, ConsensusParams, Hash256, KeyId, TxOut};
use std::collections::{BTreeMap, HashSet};

/// A proposal's vote totals: counts in units of voting power plus the
/// underlying coin-value sums.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub yes: i64,
    pub no: i64,
    pub abstain: i64,
    pub cyes: Amount,
    pub cno: Amount,
    pub cabstain: Amount,
}

impl Tally {
    pub fn net_yes(&self) -> i64 {
        self.yes - self.no
    }

    /// Fraction of yes among yes+no. Display only; the consensus filter
    /// uses exact integer comparisons.
    pub fn passing(&self) -> f64 {
        self.yes as f64 / (self.yes + self.no) as f64
    }
}

/// Tally the votes for one proposal, collapsing voting power across UTXOs
/// controlled by the same user.
///
/// Votes sharing a carrier transaction are assumed to come from one user
/// (the tx signer knows every key in it), and votes sharing a signing key
/// are certainly from one user. Both relations merge: each merged group is
/// tallied by coin value and converted to whole vote counts, and a vote
/// contributes to exactly one group.
pub fn tally_votes(proposal: &Hash256, votes: &[Vote], params: &ConsensusParams) -> Tally {
    let proposal_votes: Vec<&Vote> = votes.iter().filter(|v| v.proposal == *proposal).collect();

    // Votes by carrier transaction, and by the signer's key id. Ordered
    // maps keep the group walk deterministic.
    let mut by_tx: BTreeMap<Hash256, Vec<&Vote>> = BTreeMap::new();
    let mut by_key: BTreeMap<KeyId, Vec<&Vote>> = BTreeMap::new();
    for vote in proposal_votes.iter().copied() {
        by_tx.entry(vote.outpoint.txid).or_default().push(vote);
        by_key.entry(vote.keyid).or_default().push(vote);
    }

    let mut counted: HashSet<Hash256> = HashSet::new();
    let mut tallies: Vec<Tally> = Vec::new();

    for group in by_tx.values() {
        // Union the tx group with every key group it touches: all of it is
        // one user's (or one pool's) voting power.
        let mut unique: BTreeMap<Hash256, &Vote> = BTreeMap::new();
        for vote in group.iter().copied() {
            unique.insert(vote.hash(), vote);
            if let Some(key_group) = by_key.get(&vote.keyid) {
                for other in key_group.iter().copied() {
                    unique.insert(other.hash(), other);
                }
            }
        }
        unique.retain(|hash, _| !counted.contains(hash));
        if unique.is_empty() {
            continue;
        }
        counted.extend(unique.keys().copied());

        let mut tally = Tally::default();
        for vote in unique.values() {
            match vote.vote {
                VoteType::Yes => tally.cyes += vote.amount,
                VoteType::No => tally.cno += vote.amount,
                VoteType::Abstain => tally.cabstain += vote.amount,
            }
        }
        let balance = params.vote_balance.units();
        tally.yes = (tally.cyes.units() / balance).max(0);
        tally.no = (tally.cno.units() / balance).max(0);
        tally.abstain = (tally.cabstain.units() / balance).max(0);
        tallies.push(tally);
    }

    let mut total = Tally::default();
    for tally in tallies {
        total.yes += tally.yes;
        total.no += tally.no;
        total.abstain += tally.abstain;
        total.cyes += tally.cyes;
        total.cno += tally.cno;
        total.cabstain += tally.cabstain;
    }
    total
}

impl Governance {
    /// The tallies for every proposal scheduled for `superblock` that
    /// clears the quorum and pass thresholds.
    ///
    /// A proposal passes with a positive yes count, at least 60% yes among
    /// yes+no, and participation of at least 25% of the superblock's unique
    /// voting power. Unknown superblocks produce an empty result.
    pub fn superblock_results(&self, superblock: i32) -> BTreeMap<Proposal, Tally> {
        let params = self.params().clone();
        let mut results = BTreeMap::new();
        if !is_superblock(superblock, &params) {
            return results;
        }

        let (proposals, votes) = self.proposals_and_votes_for_superblock(superblock);

        // Unique voting power across all proposals of this superblock.
        let mut seen: HashSet<_> = HashSet::new();
        let mut unique_amount = Amount::ZERO;
        for vote in &votes {
            if seen.insert(vote.utxo) {
                unique_amount += vote.amount;
            }
        }
        let unique_power = unique_amount.units() / params.vote_balance.units();

        for proposal in proposals {
            let tally = tally_votes(&proposal.hash(), &votes, &params);
            results.insert(proposal, tally);
        }

        results.retain(|_, tally| {
            let yaynay = tally.yes + tally.no;
            let total = tally.yes + tally.no + tally.abstain;
            // yes/yaynay >= 0.6 and total >= 0.25 * unique_power, in exact
            // integer arithmetic.
            yaynay > 0 && tally.yes > 0 && tally.yes * 5 >= yaynay * 3 && total * 4 >= unique_power
        });
        results
    }

    /// The ordered payout list for a superblock's passing proposals.
    ///
    /// Sorted once by net yes votes, then yes votes, then the proposal's
    /// first-seen height. The payout budget is filled greedily in that
    /// order; a proposal that does not fit is skipped and later, smaller
    /// ones may still be admitted.
    pub fn superblock_payees(
        &self,
        superblock: i32,
        results: &BTreeMap<Proposal, Tally>,
    ) -> Vec<TxOut> {
        let params = self.params();
        let mut payees = Vec::new();
        if results.is_empty() {
            return payees;
        }

        let mut ranked: Vec<(&Proposal, &Tally)> = results.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.net_yes()
                .cmp(&a.1.net_yes())
                .then(b.1.yes.cmp(&a.1.yes))
                .then(a.0.block_number.cmp(&b.0.block_number))
        });

        let mut budget = params
            .proposal_max_amount
            .min(params.block_subsidy(superblock));
        for (proposal, _) in ranked {
            if proposal.amount > budget {
                continue;
            }
            let Ok(script) = script_for_address(&proposal.address) else {
                continue;
            };
            budget -= proposal.amount;
            payees.push(TxOut::new(proposal.amount, script));
        }
        payees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote::VinHash;
    use meridian_types::Outpoint;

    fn vote(
        proposal: Hash256,
        answer: VoteType,
        carrier_tx: u8,
        keyid: u8,
        utxo_tag: u8,
        coins: i64,
    ) -> Vote {
        let mut v = Vote::new(
            proposal,
            answer,
            Outpoint::new(Hash256::new([utxo_tag; 32]), 0),
            VinHash([0u8; 12]),
        );
        v.outpoint = Outpoint::new(Hash256::new([carrier_tx; 32]), 0);
        v.keyid = KeyId([keyid; 20]);
        v.amount = Amount::from_coins(coins);
        v
    }

    fn params() -> ConsensusParams {
        ConsensusParams::regtest()
    }

    #[test]
    fn distinct_users_count_separately() {
        let p = Hash256::new([0xaa; 32]);
        let votes = vec![
            vote(p, VoteType::Yes, 1, 1, 10, 1),
            vote(p, VoteType::Yes, 2, 2, 11, 1),
            vote(p, VoteType::Yes, 3, 3, 12, 1),
        ];
        let tally = tally_votes(&p, &votes, &params());
        assert_eq!(tally.yes, 3);
        assert_eq!(tally.no, 0);
        assert_eq!(tally.cyes, Amount::from_coins(3));
    }

    #[test]
    fn same_key_collapses_into_one_group() {
        let p = Hash256::new([0xaa; 32]);
        // Same signing key across two carrier transactions.
        let votes = vec![
            vote(p, VoteType::Yes, 1, 7, 10, 1),
            vote(p, VoteType::Yes, 2, 7, 11, 1),
        ];
        let tally = tally_votes(&p, &votes, &params());
        // One group of 2 coins => 2 units of power, counted exactly once.
        assert_eq!(tally.yes, 2);
        assert_eq!(tally.cyes, Amount::from_coins(2));
    }

    #[test]
    fn same_tx_collapses_into_one_group() {
        let p = Hash256::new([0xaa; 32]);
        let votes = vec![
            vote(p, VoteType::Yes, 1, 1, 10, 1),
            vote(p, VoteType::No, 1, 2, 11, 1),
        ];
        let tally = tally_votes(&p, &votes, &params());
        assert_eq!(tally.yes, 1);
        assert_eq!(tally.no, 1);
    }

    #[test]
    fn sub_balance_votes_round_down() {
        let p = Hash256::new([0xaa; 32]);
        // Half a coin of power with vote_balance = 1 coin.
        let mut v = vote(p, VoteType::Yes, 1, 1, 10, 0);
        v.amount = Amount::new(Amount::COIN / 2);
        let tally = tally_votes(&p, &[v], &params());
        assert_eq!(tally.yes, 0);
        assert_eq!(tally.cyes, Amount::new(Amount::COIN / 2));
    }

    #[test]
    fn other_proposals_votes_ignored() {
        let p = Hash256::new([0xaa; 32]);
        let other = Hash256::new([0xbb; 32]);
        let votes = vec![
            vote(p, VoteType::Yes, 1, 1, 10, 1),
            vote(other, VoteType::No, 2, 2, 11, 1),
        ];
        let tally = tally_votes(&p, &votes, &params());
        assert_eq!(tally.yes, 1);
        assert_eq!(tally.no, 0);
    }

    #[test]
    fn net_yes_and_passing() {
        let tally = Tally {
            yes: 3,
            no: 1,
            ..Default::default()
        };
        assert_eq!(tally.net_yes(), 2);
        assert!((tally.passing() - 0.75).abs() < f64::EPSILON);
    }
}
