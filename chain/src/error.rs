use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no block at height {0}")]
    BlockNotFound(i32),

    #[error("failed to read block {hash} from disk: {reason}")]
    ReadFailed {
        hash: meridian_types::Hash256,
        reason: String,
    },

    #[error("shutdown requested")]
    Shutdown,
}
