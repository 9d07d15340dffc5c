//! Remote proof verification
//!
//! Some hosts double-check proofs against a server-side verification API
//! before spending gas. The seam distinguishes a *rejection* (the service
//! answered "invalid") from a transport failure (the service could not be
//! reached) — callers treat those very differently.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{IdentityError, IdentityResult};
use crate::proof::{IdentityProof, VerificationLevel};

/// Payload sent to the verification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// The proof under test
    pub proof: IdentityProof,
    /// Action the proof was generated for
    pub action: String,
    /// Signal the proof was bound to
    pub signal: String,
}

/// Wire response from the verification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Verdict of a remote verification round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The service confirmed the proof
    Accepted,
    /// The service answered and the answer was "invalid" (any non-2xx
    /// style response maps here, never to a transport error)
    Rejected { status: u16, detail: String },
}

/// Seam to the server-side verification API. The production
/// implementation lives with the host; tests use [`StaticVerifier`].
#[async_trait]
pub trait RemoteVerifier: Send + Sync {
    /// Verify a proof for an action/signal pair.
    ///
    /// `Err(ServiceUnavailable)` is a network-level failure; a reachable
    /// service that declines returns `Ok(Rejected { .. })`.
    async fn verify(
        &self,
        proof: &IdentityProof,
        action: &str,
        signal: &str,
    ) -> IdentityResult<VerifyOutcome>;
}

/// Fixed-verdict verifier for tests and demos.
pub struct StaticVerifier {
    outcome: IdentityResult<VerifyOutcome>,
}

impl StaticVerifier {
    pub fn accepting() -> Self {
        Self {
            outcome: Ok(VerifyOutcome::Accepted),
        }
    }

    pub fn rejecting(status: u16, detail: &str) -> Self {
        Self {
            outcome: Ok(VerifyOutcome::Rejected {
                status,
                detail: detail.to_string(),
            }),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            outcome: Err(IdentityError::ServiceUnavailable(
                "connection refused".into(),
            )),
        }
    }
}

#[async_trait]
impl RemoteVerifier for StaticVerifier {
    async fn verify(
        &self,
        _proof: &IdentityProof,
        _action: &str,
        _signal: &str,
    ) -> IdentityResult<VerifyOutcome> {
        self.outcome.clone()
    }
}
