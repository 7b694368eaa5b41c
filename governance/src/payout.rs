//! Superblock payout validation.

use crate::engine::Governance;
use crate::superblock::is_superblock;
use meridian_types::{Amount, Block};

impl Governance {
    /// Check a candidate superblock's coinstake against the deterministic
    /// payee list. Returns `(valid, total_payment)`.
    ///
    /// Every expected payee must appear among the coinstake outputs (value
    /// and script both exact, each expected entry consumed once), and at
    /// most two outputs may remain: the coinbase marker and the staker's
    /// own reward. With no passing proposals, governance accepts any
    /// coinstake.
    pub fn is_valid_superblock(&self, block: &Block, height: i32) -> (bool, Amount) {
        if !is_superblock(height, self.params()) {
            return (false, Amount::ZERO);
        }
        if !block.is_proof_of_stake() {
            return (false, Amount::ZERO);
        }

        let results = self.superblock_results(height);
        if results.is_empty() {
            return (true, Amount::ZERO);
        }

        let mut payees = self.superblock_payees(height, &results);
        if payees.is_empty() {
            return (false, Amount::ZERO);
        }

        let mut total = Amount::ZERO;
        for payee in &payees {
            total += payee.value;
        }

        let mut vouts = block.vtx[1].vout.clone();
        if vouts.len() as i64 - payees.len() as i64 > 2 {
            return (false, total);
        }

        vouts.retain(|vout| {
            match payees.iter().position(|payee| payee == vout) {
                Some(i) => {
                    payees.remove(i);
                    false
                }
                None => true,
            }
        });

        (vouts.len() <= 2 && payees.is_empty(), total)
    }
}
