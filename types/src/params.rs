//! Consensus parameters.
//!
//! Every node on a network must agree on these values; they shape superblock
//! scheduling, proposal policy, and vote weighting.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};

/// Consensus parameters consumed by the governance engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Blocks between superblocks. Superblocks land on multiples of this.
    pub superblock_interval: i32,

    /// Height at which the governance system activates. No proposals or
    /// votes are recognized below this height.
    pub governance_activation_height: i32,

    /// Smallest amount a proposal may request.
    pub proposal_min_amount: Amount,

    /// Largest amount a proposal may request (also caps the per-superblock
    /// payout budget together with the block subsidy).
    pub proposal_max_amount: Amount,

    /// Minimum value of a UTXO used to cast a vote.
    pub vote_min_utxo_amount: Amount,

    /// Coin value of one unit of voting power.
    pub vote_balance: Amount,

    /// Blocks before a superblock after which new proposals for it are
    /// no longer accepted.
    pub proposal_cutoff: i32,

    /// Blocks before a superblock after which votes on its proposals are
    /// no longer accepted.
    pub voting_cutoff: i32,

    /// Base stake reward per block.
    pub base_subsidy: Amount,

    /// Blocks between subsidy halvings.
    pub subsidy_halving_interval: i32,
}

impl ConsensusParams {
    /// Stake reward at the given height.
    pub fn block_subsidy(&self, height: i32) -> Amount {
        let halvings = (height.max(0) / self.subsidy_halving_interval).min(62) as u32;
        Amount::new(self.base_subsidy.units() >> halvings)
    }

    /// Parameters for local regression testing: a short superblock cycle and
    /// small monetary bounds.
    pub fn regtest() -> Self {
        Self {
            superblock_interval: 100,
            governance_activation_height: 100,
            proposal_min_amount: Amount::from_coins(1),
            proposal_max_amount: Amount::from_coins(100),
            vote_min_utxo_amount: Amount::from_coins(1),
            vote_balance: Amount::from_coins(1),
            proposal_cutoff: 10,
            voting_cutoff: 5,
            base_subsidy: Amount::from_coins(200),
            subsidy_halving_interval: 1_000_000,
        }
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        // Mainnet values.
        Self {
            superblock_interval: 43_200, // one month of 60s blocks
            governance_activation_height: 518_400,
            proposal_min_amount: Amount::from_coins(10),
            proposal_max_amount: Amount::from_coins(40_000),
            vote_min_utxo_amount: Amount::from_coins(1),
            vote_balance: Amount::from_coins(5_000),
            proposal_cutoff: 2_880, // two days
            voting_cutoff: 60,      // one hour
            base_subsidy: Amount::from_coins(50),
            subsidy_halving_interval: 2_100_000,
        }
    }
}
