//! Purchase Error Taxonomy
//!
//! Every error carries enough structure for the UI to tell the user
//! whether to retry, wait, or abandon. Blanket "something went wrong"
//! messages are deliberately impossible here.

use thiserror::Error;

use noscalp_chain::ChainError;
use noscalp_identity::{IdentityError, ProofErrorCode};

use crate::flow::PurchaseStage;

/// Errors annotating a purchase flow. The flow keeps its stage when one
/// of these occurs; the error says which stage may be retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PurchaseError {
    // Local, pre-network. Never sent anywhere.
    #[error("Invalid selection: {0}")]
    Validation(String),

    #[error("Sold out")]
    SoldOut,

    // Proof acquisition declined by the provider. Never retried
    // automatically: a fresh proof needs a fresh signal and a fresh
    // user action.
    #[error("Proof acquisition failed: {}", code.code_str())]
    Proof { code: ProofErrorCode, detail: String },

    #[error("Proof provider unavailable on this host")]
    ProviderUnavailable,

    // Server-side verification answered "invalid".
    #[error("Proof verification rejected (status {status}): {detail}")]
    VerificationRejected { status: u16, detail: String },

    // Replay: this identity already purchased for this event. Fatal to
    // the attempt; no retry with the same identity.
    #[error("This identity has already purchased a ticket for this event")]
    AlreadyVerified,

    // Submission-layer failures, retryable from the purchase step
    // without re-verifying.
    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("No active wallet account")]
    NoAccount,

    #[error("Malformed proof payload")]
    MalformedProof,

    // Confirmation outcomes.
    #[error("Transaction reverted on-chain")]
    Reverted,

    #[error("Could not confirm the transaction within the wait window")]
    Unconfirmed,

    // Infrastructure, as opposed to on-chain logic.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    // Flow discipline.
    #[error("Another step of this purchase is still in flight")]
    Busy,

    #[error("Operation not allowed in stage {0:?}")]
    WrongStage(PurchaseStage),
}

impl PurchaseError {
    /// The stage the user may retry from, if any.
    ///
    /// Verification failures send the user back to `Verify` (a consumed
    /// proof cannot be reused); submission and confirmation failures are
    /// retryable from `Purchase` without re-verifying.
    pub fn retry_stage(&self) -> Option<PurchaseStage> {
        match self {
            PurchaseError::Validation(_) | PurchaseError::SoldOut => Some(PurchaseStage::Select),
            PurchaseError::Proof { code, .. } => {
                code.is_retryable_by_user().then_some(PurchaseStage::Verify)
            }
            PurchaseError::ProviderUnavailable | PurchaseError::VerificationRejected { .. } => {
                Some(PurchaseStage::Verify)
            }
            PurchaseError::AlreadyVerified => None,
            PurchaseError::Submission(_)
            | PurchaseError::NoAccount
            | PurchaseError::MalformedProof
            | PurchaseError::Reverted => Some(PurchaseStage::Purchase),
            // ambiguous: advise checking later, not resubmitting blindly
            PurchaseError::Unconfirmed => None,
            PurchaseError::Unavailable(_) => None,
            PurchaseError::Busy | PurchaseError::WrongStage(_) => None,
        }
    }

    /// User-facing message with a concrete remediation.
    pub fn user_message(&self) -> String {
        match self {
            PurchaseError::Validation(detail) => detail.clone(),
            PurchaseError::SoldOut => "Sold Out".into(),
            PurchaseError::Proof { code, .. } => code.user_message(),
            PurchaseError::ProviderUnavailable => {
                "Identity verification is not available in this app. Open Noscalp inside a \
                 supported wallet."
                    .into()
            }
            PurchaseError::VerificationRejected { detail, .. } => {
                format!("Your proof was rejected by the verification service: {detail}")
            }
            PurchaseError::AlreadyVerified => {
                "You already purchased a ticket for this event with this identity.".into()
            }
            PurchaseError::Submission(detail) => {
                format!("The transaction could not be submitted: {detail}. You can try again \
                         without re-verifying.")
            }
            PurchaseError::NoAccount => "Sign in with your wallet to continue.".into(),
            PurchaseError::MalformedProof => {
                "The proof payload was malformed. Verify again to mint a fresh proof.".into()
            }
            PurchaseError::Reverted => {
                "The purchase transaction was reverted on-chain. You can try again; your \
                 eligibility will be re-checked first."
                    .into()
            }
            PurchaseError::Unconfirmed => {
                "Could not confirm the transaction within the wait window. It may still go \
                 through — check the status again later before resubmitting."
                    .into()
            }
            PurchaseError::Unavailable(detail) => {
                format!("The service is temporarily unavailable ({detail}). Please try again \
                         in a moment.")
            }
            PurchaseError::Busy => "The previous step is still running.".into(),
            PurchaseError::WrongStage(stage) => {
                format!("This action is not available right now (stage {stage:?}).")
            }
        }
    }
}

impl From<ChainError> for PurchaseError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NoAccount => PurchaseError::NoAccount,
            ChainError::MalformedProof(_) => PurchaseError::MalformedProof,
            e if e.is_retryable() => PurchaseError::Unavailable(e.to_string()),
            e => PurchaseError::Submission(e.to_string()),
        }
    }
}

impl From<IdentityError> for PurchaseError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::ProviderUnavailable => PurchaseError::ProviderUnavailable,
            IdentityError::ServiceUnavailable(detail) => PurchaseError::Unavailable(detail),
            IdentityError::MalformedProof { .. } => PurchaseError::MalformedProof,
            IdentityError::InvalidSignal(detail) => PurchaseError::Validation(detail),
        }
    }
}

/// Result type for purchase operations
pub type PurchaseResult<T> = Result<T, PurchaseError>;
