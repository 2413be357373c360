//! Error types for on-chain authority queries.

use thiserror::Error;

/// Errors specific to chain connectivity and storage queries.
#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("Failed to connect to chain RPC at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("RPC request failed: {0}")]
    RpcError(String),

    #[error("Failed to decode chain storage: {0}")]
    DecodeError(String),

    #[error("Unsupported account for chain query: {0}")]
    UnsupportedAccount(String),
}
