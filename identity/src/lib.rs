//! Proof-of-personhood adapter
//!
//! Wraps the host's identity provider behind narrow seams: one
//! request/response proof acquisition ([`proof::ProofProvider`]), fresh
//! context-binding signals ([`signal::Signal`]), and an optional
//! server-side verification round trip ([`verify::RemoteVerifier`]).

pub mod errors;
pub mod proof;
pub mod signal;
pub mod verify;

pub use errors::{IdentityError, IdentityResult};
pub use proof::{
    IdentityProof, ProofErrorCode, ProofProvider, ProofRequest, ProofResult, ScriptedProvider,
    VerificationLevel, PROOF_ELEMENTS,
};
pub use signal::Signal;
pub use verify::{RemoteVerifier, StaticVerifier, VerifyOutcome, VerifyRequest, VerifyResponse};
