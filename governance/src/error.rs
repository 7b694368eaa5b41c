//! Engine error kinds.
//!
//! Record-level failures (bad bytes, failed policy, bad signatures, replay
//! mismatches) are swallowed during extraction — an invalid record must
//! never disrupt block processing. Only loader I/O failures and shutdown
//! surface to callers.

use crate::proposal::ProposalError;
use crate::vote::VoteError;
use meridian_types::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("policy error: {0}")]
    Policy(#[from] ProposalError),

    #[error("signature error: {0}")]
    Signature(#[from] VoteError),

    #[error("vote does not bind to its carrier transaction")]
    Replay,

    #[error("vote references an unknown proposal")]
    MissingProposal,

    #[error("vote utxo is already spent")]
    SpentUtxo,

    #[error("record arrived inside its cutoff window")]
    CutoffMissed,

    #[error("i/o error: {0}")]
    Io(String),

    #[error("shutdown requested")]
    Shutdown,
}
