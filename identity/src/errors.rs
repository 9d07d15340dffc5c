//! Identity Adapter Error Types

use thiserror::Error;

/// Errors from the identity layer itself (not provider verdicts — those
/// travel inside `ProofResult`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    #[error("Proof provider unavailable on this host")]
    ProviderUnavailable,

    #[error("Verification service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Malformed proof payload: expected {expected} bytes, got {actual}")]
    MalformedProof { expected: usize, actual: usize },

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),
}

/// Result type for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;
