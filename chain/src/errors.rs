//! Chain Access Error Types

use thiserror::Error;

/// Errors that can occur when talking to the ticketing contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    // Transport errors — the node could not be reached or answered
    // garbage. Always retryable.
    #[error("Chain unavailable: {0}")]
    Unavailable(String),

    #[error("RPC request timed out after {0} seconds")]
    RpcTimeout(u64),

    // Logical errors — the node answered, the answer was "no such thing".
    // Never retryable.
    #[error("Event not found: id {0}")]
    EventNotFound(String),

    #[error("Ticket type not found: id {0}")]
    TicketTypeNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    // Precondition failures — caught locally, nothing sent on-chain.
    #[error("No active wallet account")]
    NoAccount,

    #[error("Malformed proof: expected 8 field elements, got {0}")]
    MalformedProof(usize),

    #[error("Empty event name")]
    EmptyEventName,

    #[error("Ticket supply must be greater than zero")]
    InvalidTicketSupply,

    // Submission errors — the wallet or node rejected the transaction
    // before broadcast.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    // Codec errors
    #[error("ABI decode failed: {0}")]
    Codec(String),

    #[error("Value out of range: {0}")]
    ValueOverflow(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChainError {
    /// Whether retrying the same call can reasonably succeed.
    ///
    /// Transport-level failures are retryable; logical "not found" answers
    /// and local precondition failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Unavailable(_) | ChainError::RpcTimeout(_))
    }
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;
