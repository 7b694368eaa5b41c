//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for the Meridian protocol.
#[derive(Debug, Error)]
pub enum MeridianError {
    #[error("decode error: {0}")]
    Decode(#[from] crate::encode::DecodeError),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid block: {reason}")]
    InvalidBlock { reason: String },

    #[error("governance error: {0}")]
    Governance(String),

    #[error("chain error: {0}")]
    Chain(String),

    #[error("{0}")]
    Other(String),
}
