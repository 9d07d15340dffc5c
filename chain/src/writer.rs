//! State-changing contract calls
//!
//! Every operation hands a signed transaction to the host wallet for
//! broadcast and reports `TransactionResult`. Submission success means
//! "accepted by the node", never "confirmed" — confirmation belongs to
//! the monitor.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use tracing::info;

use crate::abi::{self, Token};
use crate::config::ChainConfig;
use crate::errors::{ChainError, ChainResult};
use crate::types::{TransactionResult, TxRequest};

/// Number of field elements in a personhood proof.
pub const PROOF_ELEMENTS: usize = 8;

/// Signing/broadcast seam to the host wallet.
///
/// An absent account is a local precondition failure; nothing reaches the
/// chain without one.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// The account backing the active session, if signed in.
    fn current_account(&self) -> Option<Address>;

    /// Sign and broadcast a transaction, returning its hash.
    async fn send_transaction(&self, request: TxRequest) -> Result<B256, String>;
}

/// Typed write surface over the ticketing contract.
#[derive(Clone)]
pub struct ChainWriter {
    bridge: Arc<dyn WalletBridge>,
    contract: Address,
}

impl ChainWriter {
    pub fn new(bridge: Arc<dyn WalletBridge>, config: &ChainConfig) -> Self {
        Self {
            bridge,
            contract: config.contract_address,
        }
    }

    /// The account that will sign outgoing transactions.
    pub fn account(&self) -> ChainResult<Address> {
        self.bridge.current_account().ok_or(ChainError::NoAccount)
    }

    async fn submit(
        &self,
        label: &'static str,
        data: alloy_primitives::Bytes,
        value: U256,
    ) -> ChainResult<TransactionResult> {
        // Precondition: an active account. Checked locally so a signed-out
        // user never produces a node round trip.
        self.account()?;

        let request = TxRequest {
            to: self.contract,
            data,
            value,
        };
        match self.bridge.send_transaction(request).await {
            Ok(hash) => {
                info!(%hash, call = label, "transaction accepted for broadcast");
                Ok(TransactionResult::accepted(hash))
            }
            Err(reason) => {
                info!(call = label, %reason, "transaction rejected before broadcast");
                Ok(TransactionResult::rejected(reason))
            }
        }
    }

    /// Create a new event owned by the current account.
    pub async fn create_event(&self, name: &str) -> ChainResult<TransactionResult> {
        if name.trim().is_empty() {
            return Err(ChainError::EmptyEventName);
        }
        let data = abi::encode_call(abi::SIG_CREATE_EVENT, &[Token::String(name.to_string())]);
        self.submit("createEvent", data, U256::ZERO).await
    }

    /// Add a ticket type to an existing event.
    pub async fn create_ticket_type(
        &self,
        event_id: U256,
        price: U256,
        supply: u64,
        name: &str,
        metadata_hash: &str,
    ) -> ChainResult<TransactionResult> {
        if supply == 0 {
            return Err(ChainError::InvalidTicketSupply);
        }
        let data = abi::encode_call(
            abi::SIG_CREATE_TICKET_TYPE,
            &[
                Token::Uint(event_id),
                Token::Uint(price),
                Token::Uint(U256::from(supply)),
                Token::String(name.to_string()),
                Token::String(metadata_hash.to_string()),
            ],
        );
        self.submit("createTicketType", data, U256::ZERO).await
    }

    /// Purchase tickets, authorized by a personhood proof.
    ///
    /// The proof must carry exactly [`PROOF_ELEMENTS`] field elements; any
    /// other shape fails locally and is never sent on-chain.
    #[allow(clippy::too_many_arguments)]
    pub async fn purchase_ticket(
        &self,
        event_id: U256,
        ticket_type_index: u64,
        quantity: u64,
        signal: &str,
        merkle_root: B256,
        nullifier_hash: B256,
        proof: &[U256],
        value_paid: U256,
    ) -> ChainResult<TransactionResult> {
        if proof.len() != PROOF_ELEMENTS {
            return Err(ChainError::MalformedProof(proof.len()));
        }
        let data = abi::encode_call(
            abi::SIG_PURCHASE_TICKET,
            &[
                Token::Uint(event_id),
                Token::Uint(U256::from(ticket_type_index)),
                Token::Uint(U256::from(quantity)),
                Token::String(signal.to_string()),
                Token::FixedBytes(merkle_root),
                Token::FixedBytes(nullifier_hash),
                Token::FixedUints(proof.to_vec()),
            ],
        );
        self.submit("purchaseTicket", data, value_paid).await
    }

    /// Toggle an event between active and inactive.
    pub async fn toggle_event_status(&self, event_id: U256) -> ChainResult<TransactionResult> {
        let data = abi::encode_call(abi::SIG_TOGGLE_EVENT_STATUS, &[Token::Uint(event_id)]);
        self.submit("toggleEventStatus", data, U256::ZERO).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoWallet;

    #[async_trait]
    impl WalletBridge for NoWallet {
        fn current_account(&self) -> Option<Address> {
            None
        }

        async fn send_transaction(&self, _request: TxRequest) -> Result<B256, String> {
            panic!("must not be reached without an account");
        }
    }

    #[tokio::test]
    async fn test_missing_account_is_local_failure() {
        let writer = ChainWriter::new(Arc::new(NoWallet), &ChainConfig::local());
        let err = writer.create_event("Devcon").await.unwrap_err();
        assert_eq!(err, ChainError::NoAccount);
    }

    #[tokio::test]
    async fn test_short_proof_never_submitted() {
        let writer = ChainWriter::new(Arc::new(NoWallet), &ChainConfig::local());
        let proof = vec![U256::ZERO; 6];
        let err = writer
            .purchase_ticket(
                U256::from(1),
                0,
                1,
                "signal",
                B256::ZERO,
                B256::ZERO,
                &proof,
                U256::ZERO,
            )
            .await
            .unwrap_err();
        // proof shape is checked before the account, so a malformed proof
        // is reported as such even without a session
        assert_eq!(err, ChainError::MalformedProof(6));
    }

    #[tokio::test]
    async fn test_empty_event_name_rejected() {
        let writer = ChainWriter::new(Arc::new(NoWallet), &ChainConfig::local());
        assert_eq!(
            writer.create_event("  ").await.unwrap_err(),
            ChainError::EmptyEventName
        );
    }
}
