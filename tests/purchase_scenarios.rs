//! End-to-end purchase flow scenarios over the simulated chain
//!
//! Each test drives the real state machine against the in-memory contract
//! and a scripted identity provider, from selection through confirmation.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};

use noscalp::identity::{ProofErrorCode, ScriptedProvider};
use noscalp::prelude::*;

const ORGANIZER: Address = Address::repeat_byte(0x11);
const BUYER: Address = Address::repeat_byte(0x22);
const PRICE: u64 = 50_000;

struct Harness {
    chain: Arc<SimulatedChain>,
    provider: Arc<ScriptedProvider>,
    flow: PurchaseFlow,
    event_id: U256,
    ticket_type_id: U256,
}

fn harness(max_supply: u64, current_supply: u64) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("noscalp_chain=debug,noscalp_purchase=debug")
        .with_test_writer()
        .try_init();

    let chain = Arc::new(SimulatedChain::new());
    let event_id = chain.seed_event(ORGANIZER, "Devcon 8", true);
    let ticket_type_id =
        chain.seed_ticket_type(event_id, U256::from(PRICE), max_supply, current_supply);

    let config = ChainConfig::local();
    let provider = Arc::new(ScriptedProvider::new());
    let flow = PurchaseFlow::new(
        FlowConfig::default(),
        ChainReader::new(chain.clone(), &config),
        ChainWriter::new(Arc::new(chain.wallet(BUYER)), &config),
        TransactionMonitor::new(chain.clone(), &config),
        provider.clone(),
        TicketLedger::new(),
    );

    Harness {
        chain,
        provider,
        flow,
        event_id,
        ticket_type_id,
    }
}

// Scenario A: sold-out ticket type blocks at selection; no proof request
// is ever made.
#[tokio::test]
async fn sold_out_ticket_blocks_before_any_proof_request() {
    let h = harness(10, 10);

    let err = h.flow.select_ticket(h.event_id, 0, 1).await.unwrap_err();
    assert_eq!(err, PurchaseError::SoldOut);
    assert_eq!(err.user_message(), "Sold Out");
    assert_eq!(h.flow.stage(), PurchaseStage::Select);
    assert_eq!(h.provider.request_count(), 0);
}

// Scenario B: provider declines with verification_rejected; flow stays at
// Verify with the exact remediation message.
#[tokio::test]
async fn rejected_verification_keeps_flow_at_verify() {
    let h = harness(10, 0);
    h.provider
        .push_failure(ProofErrorCode::VerificationRejected, "user dismissed drawer");

    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    let err = h.flow.verify().await.unwrap_err();

    assert!(matches!(
        &err,
        PurchaseError::Proof {
            code: ProofErrorCode::VerificationRejected,
            ..
        }
    ));
    assert_eq!(
        err.user_message(),
        "Verification was cancelled. Please try again if this was a mistake."
    );
    assert_eq!(h.flow.stage(), PurchaseStage::Verify);
    assert_eq!(err.retry_stage(), Some(PurchaseStage::Verify));
}

// Scenario C: nullifier already consumed for this event; hard stop before
// any transaction is submitted.
#[tokio::test]
async fn consumed_nullifier_blocks_before_submission() {
    let h = harness(10, 0);
    let nullifier = B256::repeat_byte(0xaa);
    h.chain.seed_verified(h.event_id, nullifier);
    h.provider.push_proof(nullifier);

    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    let err = h.flow.verify().await.unwrap_err();

    assert_eq!(err, PurchaseError::AlreadyVerified);
    assert_eq!(err.retry_stage(), None, "replay is not retryable");
    assert!(err.user_message().contains("already purchased"));
    // nothing was submitted: supply untouched
    assert_eq!(
        h.chain.ticket_type(h.ticket_type_id).unwrap().current_supply,
        0
    );
}

// Scenario D: transaction submitted but reverted; flow stays at Purchase,
// no ledger entry.
#[tokio::test(start_paused = true)]
async fn reverted_purchase_keeps_flow_at_purchase() {
    let h = harness(10, 0);
    h.provider.push_proof(B256::repeat_byte(0xab));
    h.chain.revert_next_purchase();

    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    h.flow.verify().await.unwrap();
    let err = h.flow.purchase().await.unwrap_err();

    assert_eq!(err, PurchaseError::Reverted);
    assert_eq!(err.retry_stage(), Some(PurchaseStage::Purchase));
    assert_eq!(h.flow.stage(), PurchaseStage::Purchase);
    assert_eq!(h.flow.ledger().ticket_count(), 0);
    // the failed hash is kept so the user can inspect it
    assert!(h.flow.intent().transaction_hash.is_some());
}

// Scenario E: no receipt within the wait budget; reported as unconfirmed
// (not failed), no ledger entry yet, resolvable later via recheck.
#[tokio::test(start_paused = true)]
async fn unconfirmed_purchase_is_ambiguous_not_failed() {
    let h = harness(10, 0);
    h.provider.push_proof(B256::repeat_byte(0xac));
    h.chain.set_withhold_receipts(true);

    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    h.flow.verify().await.unwrap();
    let err = h.flow.purchase().await.unwrap_err();

    assert_eq!(err, PurchaseError::Unconfirmed);
    assert_eq!(err.retry_stage(), None, "resubmitting blindly risks double gas");
    assert!(err.user_message().contains("check the status again later"));
    assert_eq!(h.flow.stage(), PurchaseStage::Purchase);
    assert_eq!(h.flow.ledger().ticket_count(), 0);

    // the receipt eventually shows up; recheck finalizes the purchase
    h.chain.set_withhold_receipts(false);
    h.flow.recheck().await.unwrap();
    assert_eq!(h.flow.stage(), PurchaseStage::Success);
    assert_eq!(h.flow.ledger().ticket_count(), 1);
}

// Scenario F: the full happy path appends exactly one ticket entry with
// the right ids and hash.
#[tokio::test(start_paused = true)]
async fn happy_path_appends_exactly_one_ledger_entry() {
    let h = harness(10, 0);
    h.provider.push_proof(B256::repeat_byte(0xad));

    h.flow.select_ticket(h.event_id, 0, 2).await.unwrap();
    h.flow.verify().await.unwrap();
    h.flow.purchase().await.unwrap();

    assert_eq!(h.flow.stage(), PurchaseStage::Success);

    let tickets = h.flow.ledger().tickets();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].event_id, h.event_id);
    assert_eq!(tickets[0].ticket_type_id, h.ticket_type_id);
    assert_eq!(tickets[0].balance, 2);
    let hash = h.flow.intent().transaction_hash.unwrap();
    assert_eq!(tickets[0].purchase_hash, hash);

    let txs = h.flow.ledger().transactions();
    assert_eq!(txs.len(), 1);
    // 1% simulated platform fee on top of 2 × price
    let expected = U256::from(2 * PRICE) + U256::from(2 * PRICE) / U256::from(100u64);
    assert_eq!(txs[0].total_paid, expected);

    // chain state agrees with the ledger
    assert_eq!(h.chain.balance_of(BUYER, h.ticket_type_id), 2);
    assert_eq!(
        h.chain.ticket_type(h.ticket_type_id).unwrap().current_supply,
        2
    );
}

// A second purchase with the same identity is rejected at Verify, before
// submission, even after a confirmed first purchase.
#[tokio::test(start_paused = true)]
async fn second_purchase_with_same_identity_is_blocked() {
    let h = harness(10, 0);
    let nullifier = B256::repeat_byte(0xae);
    h.provider.push_proof(nullifier);

    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    h.flow.verify().await.unwrap();
    h.flow.purchase().await.unwrap();
    assert_eq!(h.flow.stage(), PurchaseStage::Success);

    // fresh dialog, same human: the provider derives the same nullifier
    h.flow.reset();
    h.provider.push_proof(nullifier);
    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    let err = h.flow.verify().await.unwrap_err();

    assert_eq!(err, PurchaseError::AlreadyVerified);
    assert_eq!(
        h.chain.ticket_type(h.ticket_type_id).unwrap().current_supply,
        1,
        "no second transaction reached the chain"
    );
}

// Success is terminal until reset; reset starts a fresh intent at Select.
#[tokio::test(start_paused = true)]
async fn success_is_terminal_until_reset() {
    let h = harness(10, 0);
    h.provider.push_proof(B256::repeat_byte(0xaf));

    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    h.flow.verify().await.unwrap();
    h.flow.purchase().await.unwrap();

    assert!(matches!(
        h.flow.select_ticket(h.event_id, 0, 1).await.unwrap_err(),
        PurchaseError::WrongStage(PurchaseStage::Success)
    ));
    assert!(matches!(
        h.flow.purchase().await.unwrap_err(),
        PurchaseError::WrongStage(PurchaseStage::Success)
    ));

    h.flow.reset();
    assert_eq!(h.flow.stage(), PurchaseStage::Select);
    assert!(h.flow.intent().proof.is_none());
    // settled results persist across the reset
    assert_eq!(h.flow.ledger().ticket_count(), 1);
}

// Submission-layer rejection is retryable from Purchase without
// re-verifying, and the retry succeeds with the same proof.
#[tokio::test(start_paused = true)]
async fn node_rejection_is_retryable_without_reverify() {
    let h = harness(10, 0);
    h.provider.push_proof(B256::repeat_byte(0xb0));
    h.chain.reject_next_submission("insufficient funds for gas");

    h.flow.select_ticket(h.event_id, 0, 1).await.unwrap();
    h.flow.verify().await.unwrap();

    let err = h.flow.purchase().await.unwrap_err();
    assert!(matches!(&err, PurchaseError::Submission(_)));
    assert_eq!(err.retry_stage(), Some(PurchaseStage::Purchase));
    assert_eq!(h.provider.request_count(), 1);

    // same proof, second attempt
    h.flow.purchase().await.unwrap();
    assert_eq!(h.flow.stage(), PurchaseStage::Success);
    assert_eq!(h.provider.request_count(), 1, "no re-verification happened");
}

// Infrastructure failure surfaces as "service unavailable", distinct from
// validation and on-chain logic errors.
#[tokio::test]
async fn rpc_outage_is_reported_as_unavailable() {
    let h = harness(10, 0);
    h.chain.set_reads_unavailable(true);

    let err = h.flow.select_ticket(h.event_id, 0, 1).await.unwrap_err();
    assert!(matches!(&err, PurchaseError::Unavailable(_)));
    assert!(err.user_message().contains("temporarily unavailable"));
}
