//! Superblock arithmetic and cutoff windows.

use crate::proposal::Proposal;
use meridian_types::ConsensusParams;

/// The first superblock strictly after `from_block`.
pub fn next_superblock(params: &ConsensusParams, from_block: i32) -> i32 {
    from_block - from_block % params.superblock_interval + params.superblock_interval
}

/// The superblock at or immediately before `from_block`.
pub fn previous_superblock(params: &ConsensusParams, from_block: i32) -> i32 {
    next_superblock(params, from_block) - params.superblock_interval
}

/// True if `height` is a superblock: governance is active and the height
/// sits on the superblock interval.
pub fn is_superblock(height: i32, params: &ConsensusParams) -> bool {
    height >= params.governance_activation_height && height % params.superblock_interval == 0
}

/// True while a proposal can still be submitted for its superblock.
///
/// Proposals may target superblocks far in the future, so the window is
/// relative to the proposal's own superblock, not the next one.
pub fn outside_proposal_cutoff(
    proposal: &Proposal,
    block_number: i32,
    params: &ConsensusParams,
) -> bool {
    if proposal.is_null() {
        return false;
    }
    block_number < proposal.superblock - params.proposal_cutoff
}

/// True while votes on a proposal are still accepted.
pub fn outside_voting_cutoff(
    proposal: &Proposal,
    block_number: i32,
    params: &ConsensusParams,
) -> bool {
    if proposal.is_null() {
        return false;
    }
    block_number < proposal.superblock - params.voting_cutoff
}

/// True if `block_number` falls in the frozen window between a superblock's
/// voting cutoff and the superblock itself.
pub fn inside_vote_cutoff(superblock: i32, block_number: i32, params: &ConsensusParams) -> bool {
    block_number >= superblock - params.voting_cutoff && block_number <= superblock
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_types::Amount;

    fn params() -> ConsensusParams {
        ConsensusParams::regtest()
    }

    fn proposal_for(superblock: i32) -> Proposal {
        Proposal::new(
            "test",
            superblock,
            Amount::from_coins(10),
            "mrd1unused",
            "",
            "",
        )
    }

    #[test]
    fn next_and_previous() {
        let p = params();
        assert_eq!(next_superblock(&p, 0), 100);
        assert_eq!(next_superblock(&p, 99), 100);
        assert_eq!(next_superblock(&p, 100), 200);
        assert_eq!(next_superblock(&p, 150), 200);
        assert_eq!(previous_superblock(&p, 150), 100);
        assert_eq!(previous_superblock(&p, 200), 200);
    }

    #[test]
    fn superblock_requires_activation() {
        let p = params();
        assert!(!is_superblock(0, &p));
        assert!(is_superblock(100, &p));
        assert!(is_superblock(200, &p));
        assert!(!is_superblock(150, &p));
    }

    #[test]
    fn proposal_cutoff_boundary() {
        let p = params();
        let proposal = proposal_for(200);
        // cutoff = 10: accepted strictly below 190
        assert!(outside_proposal_cutoff(&proposal, 189, &p));
        assert!(!outside_proposal_cutoff(&proposal, 190, &p));
    }

    #[test]
    fn voting_cutoff_boundary() {
        let p = params();
        let proposal = proposal_for(200);
        // cutoff = 5: accepted strictly below 195
        assert!(outside_voting_cutoff(&proposal, 194, &p));
        assert!(!outside_voting_cutoff(&proposal, 195, &p));
    }

    #[test]
    fn null_proposal_is_never_outside() {
        let p = params();
        let null = proposal_for(0);
        assert!(!outside_proposal_cutoff(&null, 0, &p));
        assert!(!outside_voting_cutoff(&null, 0, &p));
    }

    #[test]
    fn vote_cutoff_window() {
        let p = params();
        assert!(!inside_vote_cutoff(200, 194, &p));
        assert!(inside_vote_cutoff(200, 195, &p));
        assert!(inside_vote_cutoff(200, 200, &p));
        assert!(!inside_vote_cutoff(200, 201, &p));
    }
}
