//! Proof acquisition
//!
//! One request/response call per proof: the flow asks the host's identity
//! provider for a zero-knowledge proof of personhood bound to an
//! `(action, signal)` pair and gets back a tagged verdict. No standing
//! subscriptions.

use alloy_primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{IdentityError, IdentityResult};

/// Number of field elements in a personhood proof.
pub const PROOF_ELEMENTS: usize = 8;

/// Strength of the identity check behind a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    /// Device-based check
    Device,
    /// Biometric orb check
    Orb,
}

/// Provider error codes the flow must map to user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofErrorCode {
    VerificationRejected,
    MaxVerificationsReached,
    CredentialUnavailable,
    MalformedRequest,
    InvalidNetwork,
    InclusionProofFailed,
    InclusionProofPending,
    /// Forward compatibility: a code this client does not know yet
    Unknown(String),
}

impl ProofErrorCode {
    /// Parse a wire-format code string.
    pub fn from_code(code: &str) -> Self {
        match code {
            "verification_rejected" => Self::VerificationRejected,
            "max_verifications_reached" => Self::MaxVerificationsReached,
            "credential_unavailable" => Self::CredentialUnavailable,
            "malformed_request" => Self::MalformedRequest,
            "invalid_network" => Self::InvalidNetwork,
            "inclusion_proof_failed" => Self::InclusionProofFailed,
            "inclusion_proof_pending" => Self::InclusionProofPending,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code_str(&self) -> &str {
        match self {
            Self::VerificationRejected => "verification_rejected",
            Self::MaxVerificationsReached => "max_verifications_reached",
            Self::CredentialUnavailable => "credential_unavailable",
            Self::MalformedRequest => "malformed_request",
            Self::InvalidNetwork => "invalid_network",
            Self::InclusionProofFailed => "inclusion_proof_failed",
            Self::InclusionProofPending => "inclusion_proof_pending",
            Self::Unknown(code) => code,
        }
    }

    /// User-facing message with a remediation hint. No blanket wording:
    /// every code tells the user whether to retry, wait, or stop.
    pub fn user_message(&self) -> String {
        match self {
            Self::VerificationRejected => {
                "Verification was cancelled. Please try again if this was a mistake.".into()
            }
            Self::MaxVerificationsReached => {
                "You have reached the verification limit for this action.".into()
            }
            Self::CredentialUnavailable => {
                "No verified credential is available on this device. Complete identity \
                 verification first."
                    .into()
            }
            Self::MalformedRequest => {
                "The verification request was malformed. Please try again.".into()
            }
            Self::InvalidNetwork => {
                "Your identity app is configured for a different network.".into()
            }
            Self::InclusionProofFailed => {
                "Your identity could not be confirmed on-chain. Please try again later.".into()
            }
            Self::InclusionProofPending => {
                "Your identity is still being registered. Try again in a few minutes.".into()
            }
            Self::Unknown(code) => format!("Verification failed ({code}). Please try again."),
        }
    }

    /// Whether explicitly re-triggering verification can help the user.
    /// Never used to retry automatically — a consumed proof cannot be
    /// reissued without a fresh signal and a fresh user action.
    pub fn is_retryable_by_user(&self) -> bool {
        !matches!(self, Self::MaxVerificationsReached | Self::InvalidNetwork)
    }
}

/// A zero-knowledge proof of unique personhood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProof {
    /// Merkle root of the identity set the proof was generated against
    pub merkle_root: B256,
    /// Pseudonymous, per-action identifier of the prover
    pub nullifier_hash: B256,
    /// Opaque proof payload; [`IdentityProof::decode_proof`] unpacks it
    pub proof: Bytes,
    /// Strength of the underlying identity check
    pub verification_level: VerificationLevel,
}

impl IdentityProof {
    /// Unpack the opaque proof into the 8 field elements the on-chain
    /// verifier expects. Any other shape is a local failure; it is never
    /// sent to the chain.
    pub fn decode_proof(&self) -> IdentityResult<[U256; PROOF_ELEMENTS]> {
        let expected = PROOF_ELEMENTS * 32;
        if self.proof.len() != expected {
            return Err(IdentityError::MalformedProof {
                expected,
                actual: self.proof.len(),
            });
        }
        let mut elements = [U256::ZERO; PROOF_ELEMENTS];
        for (i, chunk) in self.proof.chunks_exact(32).enumerate() {
            elements[i] = U256::from_be_slice(chunk);
        }
        Ok(elements)
    }
}

/// A proof request bound to an `(action, signal)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Application action identifier
    pub action: String,
    /// Context-binding signal; replaying the proof against a different
    /// context fails verification
    pub signal: String,
    /// Requested verification level
    pub verification_level: VerificationLevel,
}

/// Tagged provider verdict. Exhaustively matched by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofResult {
    /// A proof was issued
    Verified(IdentityProof),
    /// The provider declined, with a mapped code and raw detail
    Failed { code: ProofErrorCode, detail: String },
}

/// Host seam for proof acquisition.
#[async_trait]
pub trait ProofProvider: Send + Sync {
    /// Request one proof for the given action/signal.
    ///
    /// `Err` means the host could not run the provider at all (no identity
    /// runtime); provider-level declines come back as `ProofResult::Failed`.
    async fn request_proof(&self, request: &ProofRequest) -> IdentityResult<ProofResult>;
}

/// Scripted provider for tests and demos: pops pre-queued verdicts and
/// records every request it sees.
pub struct ScriptedProvider {
    verdicts: parking_lot::Mutex<std::collections::VecDeque<IdentityResult<ProofResult>>>,
    requests: parking_lot::Mutex<Vec<ProofRequest>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            verdicts: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Queue the next verdict.
    pub fn push(&self, verdict: IdentityResult<ProofResult>) {
        self.verdicts.lock().push_back(verdict);
    }

    /// Queue a successful proof with the given nullifier.
    pub fn push_proof(&self, nullifier_hash: B256) {
        self.push(Ok(ProofResult::Verified(IdentityProof {
            merkle_root: B256::repeat_byte(0x01),
            nullifier_hash,
            proof: Bytes::from(vec![0u8; PROOF_ELEMENTS * 32]),
            verification_level: VerificationLevel::Orb,
        })));
    }

    /// Queue a provider decline.
    pub fn push_failure(&self, code: ProofErrorCode, detail: &str) {
        self.push(Ok(ProofResult::Failed {
            code,
            detail: detail.to_string(),
        }));
    }

    /// Requests observed so far.
    pub fn requests(&self) -> Vec<ProofRequest> {
        self.requests.lock().clone()
    }

    /// Number of proof requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ProofProvider for ScriptedProvider {
    async fn request_proof(&self, request: &ProofRequest) -> IdentityResult<ProofResult> {
        self.requests.lock().push(request.clone());
        self.verdicts
            .lock()
            .pop_front()
            .unwrap_or(Err(IdentityError::ProviderUnavailable))
    }
}
