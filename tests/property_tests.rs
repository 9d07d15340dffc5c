//! Property-Based Tests for Noscalp Invariants
//!
//! Uses proptest to generate random inputs and verify the supply
//! arithmetic, signal, proof-codec and error-routing invariants hold.

use proptest::prelude::*;

use alloy_primitives::{Bytes, B256, U256};
use noscalp::chain::TicketType;
use noscalp::identity::{
    IdentityProof, ProofErrorCode, Signal, VerificationLevel, PROOF_ELEMENTS,
};
use noscalp::purchase::{PurchaseError, PurchaseStage};

// =============================================================================
// PROPTEST STRATEGIES
// =============================================================================

/// Strategy for generating random 32-byte words
fn bytes32() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

fn ticket(max_supply: u64, current_supply: u64) -> TicketType {
    TicketType {
        id: U256::from(1),
        event_id: U256::from(1),
        name: "GA".to_string(),
        price: U256::from(50_000u64),
        max_supply,
        current_supply,
        ipfs_hash: "QmTest".to_string(),
    }
}

/// Strategy for the known wire-format provider error codes
fn known_code() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("verification_rejected"),
        Just("max_verifications_reached"),
        Just("credential_unavailable"),
        Just("malformed_request"),
        Just("invalid_network"),
        Just("inclusion_proof_failed"),
        Just("inclusion_proof_pending"),
    ]
}

// =============================================================================
// SUPPLY ARITHMETIC
// =============================================================================

proptest! {
    /// Property: remaining never exceeds max, and can_mint agrees with
    /// remaining exactly
    #[test]
    fn supply_arithmetic_is_consistent(
        max in 0u64..1_000_000,
        current in 0u64..1_000_000,
        quantity in 1u64..10_000,
    ) {
        let t = ticket(max, current);

        prop_assert!(t.remaining() <= max);
        prop_assert_eq!(t.is_sold_out(), t.remaining() == 0);
        prop_assert_eq!(t.can_mint(quantity), quantity <= t.remaining());
    }

    /// Property: can_mint never overflows, even at the u64 edges
    #[test]
    fn can_mint_survives_extreme_quantities(
        current in any::<u64>(),
        quantity in any::<u64>(),
    ) {
        let t = ticket(u64::MAX, current);
        // must not panic; truth matches checked arithmetic
        let expected = current.checked_add(quantity).is_some();
        prop_assert_eq!(t.can_mint(quantity), expected);
    }

    /// Property: total price scales linearly while it fits
    #[test]
    fn total_price_is_linear(quantity in 1u64..1_000) {
        let t = ticket(10, 0);
        let total = t.total_price(quantity).unwrap();
        prop_assert_eq!(total, U256::from(50_000u64) * U256::from(quantity));
    }
}

// =============================================================================
// SIGNALS
// =============================================================================

proptest! {
    /// Property: a signal always embeds its purchase context as a prefix
    #[test]
    fn signal_embeds_its_context(
        event_id in bytes32(),
        index in any::<u64>(),
    ) {
        let event_id = U256::from_be_bytes(event_id);
        let signal = Signal::generate(event_id, index);
        let prefix = format!("{event_id}-{index}-");
        prop_assert!(signal.as_str().starts_with(&prefix));
    }

    /// Property: two signals for the same context are never equal
    #[test]
    fn signals_are_unique_per_attempt(
        event_id in bytes32(),
        index in any::<u64>(),
    ) {
        let event_id = U256::from_be_bytes(event_id);
        let a = Signal::generate(event_id, index);
        let b = Signal::generate(event_id, index);
        prop_assert_ne!(a, b);
    }
}

// =============================================================================
// PROOF PAYLOADS
// =============================================================================

proptest! {
    /// Property: only exactly 8×32 bytes decode; every other length fails
    /// locally
    #[test]
    fn proof_decoding_accepts_only_the_exact_shape(len in 0usize..1024) {
        let proof = IdentityProof {
            merkle_root: B256::ZERO,
            nullifier_hash: B256::ZERO,
            proof: Bytes::from(vec![0u8; len]),
            verification_level: VerificationLevel::Orb,
        };
        prop_assert_eq!(proof.decode_proof().is_ok(), len == PROOF_ELEMENTS * 32);
    }

    /// Property: decoded elements reproduce the big-endian payload words
    #[test]
    fn proof_elements_match_payload_words(
        words in prop::collection::vec(bytes32(), PROOF_ELEMENTS)
    ) {
        let payload: Vec<u8> = words.iter().flatten().copied().collect();
        let proof = IdentityProof {
            merkle_root: B256::ZERO,
            nullifier_hash: B256::ZERO,
            proof: Bytes::from(payload),
            verification_level: VerificationLevel::Orb,
        };
        let elements = proof.decode_proof().unwrap();
        for (element, word) in elements.iter().zip(&words) {
            prop_assert_eq!(*element, U256::from_be_bytes(*word));
        }
    }
}

// =============================================================================
// ERROR ROUTING
// =============================================================================

proptest! {
    /// Property: known provider codes round-trip through the wire format
    #[test]
    fn known_codes_roundtrip(code in known_code()) {
        let parsed = ProofErrorCode::from_code(code);
        prop_assert_eq!(parsed.code_str(), code);
    }

    /// Property: unknown codes are preserved verbatim, never collapsed
    /// into a known variant
    #[test]
    fn unknown_codes_are_preserved(code in "[a-z]{1,8}_[a-z]{9,20}") {
        let parsed = ProofErrorCode::from_code(&code);
        prop_assert_eq!(parsed.code_str(), code.as_str());
    }

    /// Property: every error yields a non-empty user message, and a retry
    /// stage only from the stages a user can actually act on
    #[test]
    fn errors_always_carry_a_message(detail in ".{1,64}", status in any::<u16>()) {
        let errors = vec![
            PurchaseError::Validation(detail.clone()),
            PurchaseError::SoldOut,
            PurchaseError::VerificationRejected { status, detail: detail.clone() },
            PurchaseError::AlreadyVerified,
            PurchaseError::Submission(detail.clone()),
            PurchaseError::Reverted,
            PurchaseError::Unconfirmed,
            PurchaseError::Unavailable(detail),
        ];
        for err in errors {
            prop_assert!(!err.user_message().is_empty());
            if let Some(stage) = err.retry_stage() {
                prop_assert_ne!(stage, PurchaseStage::Success);
            }
        }
    }
}
