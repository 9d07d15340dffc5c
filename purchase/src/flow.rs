//! Purchase state machine
//!
//! Orchestrates one ticket purchase: Select → Verify → Purchase → Success,
//! with an error overlay that annotates the current stage instead of
//! discarding progress. One flow instance belongs to one purchase dialog;
//! dismissing the dialog resets the flow and strands any in-flight result.
//!
//! Ordering rules enforced here:
//! - no proof request before a valid, in-supply selection;
//! - the replay check runs after proof acquisition *and again* strictly
//!   before every transaction submission;
//! - the ledger is written exactly once, on confirmation, by this flow
//!   and nothing else.

use std::sync::Arc;

use alloy_primitives::U256;
use parking_lot::Mutex;
use tracing::{info, warn};

use noscalp_chain::{ChainReader, ChainWriter, ConfirmationStatus, TransactionMonitor};
use noscalp_identity::{
    ProofProvider, ProofRequest, ProofResult, RemoteVerifier, Signal, VerificationLevel,
    VerifyOutcome,
};

use crate::errors::{PurchaseError, PurchaseResult};
use crate::intent::PurchaseIntent;
use crate::ledger::TicketLedger;

/// Current stage of a purchase flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStage {
    /// Choosing a ticket type and quantity
    Select,
    /// Acquiring and checking a personhood proof
    Verify,
    /// Submitting and confirming the transaction
    Purchase,
    /// Purchase confirmed; terminal until reset
    Success,
}

/// Flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Identity action the proofs are bound to
    pub action: String,
    /// Verification level to request
    pub verification_level: VerificationLevel,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            action: "purchase-ticket".to_string(),
            verification_level: VerificationLevel::Orb,
        }
    }
}

struct FlowState {
    stage: PurchaseStage,
    intent: PurchaseIntent,
    last_error: Option<PurchaseError>,
    in_flight: bool,
    /// Bumped on reset; async steps carry the epoch they started under
    /// and settle only if it still matches.
    epoch: u64,
}

/// One purchase attempt, from selection to confirmed ticket.
pub struct PurchaseFlow {
    config: FlowConfig,
    reader: ChainReader,
    writer: ChainWriter,
    monitor: TransactionMonitor,
    provider: Arc<dyn ProofProvider>,
    remote: Option<Arc<dyn RemoteVerifier>>,
    ledger: TicketLedger,
    state: Mutex<FlowState>,
}

impl PurchaseFlow {
    pub fn new(
        config: FlowConfig,
        reader: ChainReader,
        writer: ChainWriter,
        monitor: TransactionMonitor,
        provider: Arc<dyn ProofProvider>,
        ledger: TicketLedger,
    ) -> Self {
        Self {
            config,
            reader,
            writer,
            monitor,
            provider,
            remote: None,
            ledger,
            state: Mutex::new(FlowState {
                stage: PurchaseStage::Select,
                intent: PurchaseIntent::new(),
                last_error: None,
                in_flight: false,
                epoch: 0,
            }),
        }
    }

    /// Route obtained proofs through a server-side verification check
    /// before any chain traffic.
    pub fn with_remote_verifier(mut self, remote: Arc<dyn RemoteVerifier>) -> Self {
        self.remote = Some(remote);
        self
    }

    // --- snapshots --------------------------------------------------------

    pub fn stage(&self) -> PurchaseStage {
        self.state.lock().stage
    }

    pub fn last_error(&self) -> Option<PurchaseError> {
        self.state.lock().last_error.clone()
    }

    pub fn intent(&self) -> PurchaseIntent {
        self.state.lock().intent.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn ledger(&self) -> &TicketLedger {
        &self.ledger
    }

    // --- flight discipline ------------------------------------------------

    /// Claim the single in-flight slot, or refuse re-entry.
    fn begin(&self, expect: PurchaseStage) -> PurchaseResult<(u64, PurchaseIntent)> {
        let mut state = self.state.lock();
        if state.in_flight {
            return Err(PurchaseError::Busy);
        }
        if state.stage != expect {
            return Err(PurchaseError::WrongStage(state.stage));
        }
        state.in_flight = true;
        state.last_error = None;
        Ok((state.epoch, state.intent.clone()))
    }

    /// Apply a step outcome unless the owning dialog was dismissed in the
    /// meantime. Stale results mutate nothing, ledger included.
    fn settle(&self, epoch: u64, apply: impl FnOnce(&mut FlowState)) -> bool {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return false;
        }
        state.in_flight = false;
        apply(&mut state);
        true
    }

    fn fail(&self, epoch: u64, error: PurchaseError) -> PurchaseError {
        warn!(?error, "purchase step failed");
        self.settle(epoch, |state| state.last_error = Some(error.clone()));
        error
    }

    // --- transitions ------------------------------------------------------

    /// Select a ticket type and quantity. On success the flow moves to
    /// `Verify`; validation failures keep it at `Select` and make no
    /// proof request.
    pub async fn select_ticket(
        &self,
        event_id: U256,
        ticket_type_index: u64,
        quantity: u64,
    ) -> PurchaseResult<()> {
        let (epoch, _) = self.begin(PurchaseStage::Select)?;

        if quantity == 0 {
            return Err(self.fail(epoch, PurchaseError::Validation(
                "Quantity must be at least 1.".into(),
            )));
        }

        let event = match self.reader.get_event(event_id).await {
            Ok(event) => event,
            Err(e) => return Err(self.fail(epoch, read_error(e))),
        };
        if !event.active {
            return Err(self.fail(epoch, PurchaseError::Validation(
                "Ticket sales are closed for this event.".into(),
            )));
        }

        let ticket_type_id = match event.ticket_type_id(ticket_type_index as usize) {
            Some(id) => id,
            None => {
                return Err(self.fail(epoch, PurchaseError::Validation(
                    "Unknown ticket type.".into(),
                )))
            }
        };
        let ticket = match self.reader.get_ticket_type(ticket_type_id).await {
            Ok(ticket) => ticket,
            Err(e) => return Err(self.fail(epoch, read_error(e))),
        };

        if ticket.is_sold_out() {
            return Err(self.fail(epoch, PurchaseError::SoldOut));
        }
        if !ticket.can_mint(quantity) {
            return Err(self.fail(epoch, PurchaseError::Validation(format!(
                "Only {} tickets remaining.",
                ticket.remaining()
            ))));
        }

        info!(%event_id, ticket_type_index, quantity, "ticket selected");
        self.settle(epoch, |state| {
            state.intent = PurchaseIntent {
                event_id,
                ticket_type_index,
                ticket_type_id,
                quantity,
                ..PurchaseIntent::new()
            };
            state.stage = PurchaseStage::Verify;
        });
        Ok(())
    }

    /// Acquire a personhood proof for a fresh signal and run the replay
    /// check. On success the flow moves to `Purchase`; any failure keeps
    /// it at `Verify` with a populated error.
    pub async fn verify(&self) -> PurchaseResult<()> {
        let (epoch, intent) = self.begin(PurchaseStage::Verify)?;

        // A fresh signal every attempt: a proof, once consumed, can never
        // be reissued for the same signal.
        let signal = Signal::generate(intent.event_id, intent.ticket_type_index);
        let request = ProofRequest {
            action: self.config.action.clone(),
            signal: signal.as_str().to_string(),
            verification_level: self.config.verification_level,
        };

        let proof = match self.provider.request_proof(&request).await {
            Ok(ProofResult::Verified(proof)) => proof,
            Ok(ProofResult::Failed { code, detail }) => {
                return Err(self.fail(epoch, PurchaseError::Proof { code, detail }))
            }
            Err(e) => return Err(self.fail(epoch, e.into())),
        };

        // Malformed payloads stop here; nothing malformed is ever sent on.
        if let Err(e) = proof.decode_proof() {
            return Err(self.fail(epoch, e.into()));
        }

        if let Some(remote) = &self.remote {
            match remote
                .verify(&proof, &self.config.action, signal.as_str())
                .await
            {
                Ok(VerifyOutcome::Accepted) => {}
                Ok(VerifyOutcome::Rejected { status, detail }) => {
                    return Err(self.fail(epoch, PurchaseError::VerificationRejected {
                        status,
                        detail,
                    }))
                }
                Err(e) => return Err(self.fail(epoch, e.into())),
            }
        }

        match self
            .reader
            .is_verified(intent.event_id, proof.nullifier_hash)
            .await
        {
            Ok(true) => return Err(self.fail(epoch, PurchaseError::AlreadyVerified)),
            Ok(false) => {}
            Err(e) => return Err(self.fail(epoch, read_error(e))),
        }

        info!(nullifier = %proof.nullifier_hash, "proof obtained and unused");
        self.settle(epoch, |state| {
            state.intent.signal = Some(signal);
            state.intent.proof = Some(proof);
            state.stage = PurchaseStage::Purchase;
        });
        Ok(())
    }

    /// Submit the purchase transaction and wait for confirmation. On
    /// confirmation the flow reaches `Success` and appends the ledger
    /// entries; a revert or an exhausted wait window keeps it at
    /// `Purchase` with the respective error.
    pub async fn purchase(&self) -> PurchaseResult<()> {
        let (epoch, intent) = self.begin(PurchaseStage::Purchase)?;

        let (proof, signal) = match (&intent.proof, &intent.signal) {
            (Some(p), Some(s)) => (p.clone(), s.clone()),
            _ => return Err(self.fail(epoch, PurchaseError::WrongStage(PurchaseStage::Purchase))),
        };

        // Replay check strictly before submission. This also covers
        // resubmission after a revert: if the failed attempt consumed the
        // nullifier after all, the user learns it here instead of paying
        // gas to find out.
        match self
            .reader
            .is_verified(intent.event_id, proof.nullifier_hash)
            .await
        {
            Ok(true) => return Err(self.fail(epoch, PurchaseError::AlreadyVerified)),
            Ok(false) => {}
            Err(e) => return Err(self.fail(epoch, read_error(e))),
        }

        // Supply may have moved since selection.
        let ticket = match self.reader.get_ticket_type(intent.ticket_type_id).await {
            Ok(ticket) => ticket,
            Err(e) => return Err(self.fail(epoch, read_error(e))),
        };
        if !ticket.can_mint(intent.quantity) {
            return Err(self.fail(epoch, PurchaseError::SoldOut));
        }

        let total = match ticket.total_price(intent.quantity) {
            Some(total) => total,
            None => {
                return Err(self.fail(epoch, PurchaseError::Validation(
                    "Price overflow.".into(),
                )))
            }
        };
        let fee = match self.reader.fee_for(total).await {
            Ok(fee) => fee,
            Err(e) => return Err(self.fail(epoch, read_error(e))),
        };
        let value_paid = match total.checked_add(fee) {
            Some(v) => v,
            None => {
                return Err(self.fail(epoch, PurchaseError::Validation(
                    "Price overflow.".into(),
                )))
            }
        };

        let elements = match proof.decode_proof() {
            Ok(elements) => elements,
            Err(e) => return Err(self.fail(epoch, e.into())),
        };

        let result = match self
            .writer
            .purchase_ticket(
                intent.event_id,
                intent.ticket_type_index,
                intent.quantity,
                signal.as_str(),
                proof.merkle_root,
                proof.nullifier_hash,
                &elements,
                value_paid,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => return Err(self.fail(epoch, e.into())),
        };
        if !result.success {
            let reason = result.error.unwrap_or_else(|| "rejected by node".into());
            return Err(self.fail(epoch, PurchaseError::Submission(reason)));
        }
        let hash = result.hash;
        info!(%hash, "purchase submitted, waiting for confirmation");

        match self.monitor.monitor(hash).await {
            Ok(ConfirmationStatus::Confirmed { block_number }) => {
                info!(%hash, block_number, "purchase confirmed");
                self.settle(epoch, |state| {
                    state.intent.transaction_hash = Some(hash);
                    state.intent.value_paid = Some(value_paid);
                    state.stage = PurchaseStage::Success;
                    self.ledger.record_purchase(
                        intent.event_id,
                        intent.ticket_type_id,
                        intent.quantity,
                        value_paid,
                        hash,
                    );
                });
                Ok(())
            }
            Ok(ConfirmationStatus::Reverted) => {
                self.settle(epoch, |state| {
                    state.intent.transaction_hash = Some(hash);
                    state.last_error = Some(PurchaseError::Reverted);
                });
                Err(PurchaseError::Reverted)
            }
            Ok(ConfirmationStatus::Unconfirmed) => {
                self.settle(epoch, |state| {
                    state.intent.transaction_hash = Some(hash);
                    state.intent.value_paid = Some(value_paid);
                    state.last_error = Some(PurchaseError::Unconfirmed);
                });
                Err(PurchaseError::Unconfirmed)
            }
            Err(e) => Err(self.fail(epoch, e.into())),
        }
    }

    /// Single-shot status probe for a previously unconfirmed submission.
    /// Finalizes the purchase if the transaction landed in the meantime.
    pub async fn recheck(&self) -> PurchaseResult<()> {
        let (epoch, intent) = self.begin(PurchaseStage::Purchase)?;

        let hash = match intent.transaction_hash {
            Some(hash) => hash,
            None => return Err(self.fail(epoch, PurchaseError::WrongStage(PurchaseStage::Purchase))),
        };

        match self.monitor.check_once(hash).await {
            Ok(ConfirmationStatus::Confirmed { block_number }) => {
                info!(%hash, block_number, "previously unconfirmed purchase landed");
                self.settle(epoch, |state| {
                    state.stage = PurchaseStage::Success;
                    self.ledger.record_purchase(
                        intent.event_id,
                        intent.ticket_type_id,
                        intent.quantity,
                        intent.value_paid.unwrap_or(U256::ZERO),
                        hash,
                    );
                });
                Ok(())
            }
            Ok(ConfirmationStatus::Reverted) => Err(self.fail(epoch, PurchaseError::Reverted)),
            Ok(ConfirmationStatus::Unconfirmed) => {
                Err(self.fail(epoch, PurchaseError::Unconfirmed))
            }
            Err(e) => Err(self.fail(epoch, e.into())),
        }
    }

    /// Tear the flow down to a fresh intent at `Select`. Any in-flight
    /// step becomes stale and its result is disregarded.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.in_flight = false;
        state.stage = PurchaseStage::Select;
        state.intent = PurchaseIntent::new();
        state.last_error = None;
    }
}

/// Map read-surface failures: transport problems are "service
/// unavailable", logical not-found answers are selection problems.
fn read_error(err: noscalp_chain::ChainError) -> PurchaseError {
    if err.is_retryable() {
        PurchaseError::Unavailable(err.to_string())
    } else {
        PurchaseError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use noscalp_chain::{ChainConfig, SimulatedChain};
    use noscalp_identity::ScriptedProvider;

    fn buyer() -> Address {
        Address::repeat_byte(0x22)
    }

    fn flow_over(chain: &Arc<SimulatedChain>, provider: Arc<ScriptedProvider>) -> PurchaseFlow {
        let config = ChainConfig::local();
        PurchaseFlow::new(
            FlowConfig::default(),
            ChainReader::new(chain.clone(), &config),
            ChainWriter::new(Arc::new(chain.wallet(buyer())), &config),
            TransactionMonitor::new(chain.clone(), &config),
            provider,
            TicketLedger::new(),
        )
    }

    #[tokio::test]
    async fn test_verify_refused_before_selection() {
        let chain = Arc::new(SimulatedChain::new());
        let provider = Arc::new(ScriptedProvider::new());
        let flow = flow_over(&chain, provider.clone());

        assert_eq!(
            flow.verify().await.unwrap_err(),
            PurchaseError::WrongStage(PurchaseStage::Select)
        );
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_purchase_refused_before_verification() {
        let chain = Arc::new(SimulatedChain::new());
        let event_id = chain.seed_event(Address::repeat_byte(0x11), "Devcon", true);
        chain.seed_ticket_type(event_id, U256::from(100u64), 10, 0);
        let flow = flow_over(&chain, Arc::new(ScriptedProvider::new()));

        flow.select_ticket(event_id, 0, 1).await.unwrap();
        assert_eq!(
            flow.purchase().await.unwrap_err(),
            PurchaseError::WrongStage(PurchaseStage::Verify)
        );
    }

    #[tokio::test]
    async fn test_zero_quantity_stays_at_select() {
        let chain = Arc::new(SimulatedChain::new());
        let event_id = chain.seed_event(Address::repeat_byte(0x11), "Devcon", true);
        chain.seed_ticket_type(event_id, U256::from(100u64), 10, 0);
        let flow = flow_over(&chain, Arc::new(ScriptedProvider::new()));

        let err = flow.select_ticket(event_id, 0, 0).await.unwrap_err();
        assert!(matches!(&err, PurchaseError::Validation(_)));
        assert_eq!(flow.stage(), PurchaseStage::Select);
        assert_eq!(flow.last_error(), Some(err));
    }

    #[tokio::test]
    async fn test_inactive_event_blocks_selection() {
        let chain = Arc::new(SimulatedChain::new());
        let event_id = chain.seed_event(Address::repeat_byte(0x11), "Devcon", false);
        chain.seed_ticket_type(event_id, U256::from(100u64), 10, 0);
        let flow = flow_over(&chain, Arc::new(ScriptedProvider::new()));

        let err = flow.select_ticket(event_id, 0, 1).await.unwrap_err();
        assert!(matches!(err, PurchaseError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reset_discards_stale_results() {
        use alloy_primitives::B256;

        let chain = Arc::new(SimulatedChain::new());
        let event_id = chain.seed_event(Address::repeat_byte(0x11), "Devcon", true);
        chain.seed_ticket_type(event_id, U256::from(100u64), 10, 0);

        // provider that waits until the test says go
        struct GatedProvider {
            gate: Arc<tokio::sync::Notify>,
            inner: ScriptedProvider,
        }

        #[async_trait::async_trait]
        impl ProofProvider for GatedProvider {
            async fn request_proof(
                &self,
                request: &ProofRequest,
            ) -> noscalp_identity::IdentityResult<ProofResult> {
                self.gate.notified().await;
                self.inner.request_proof(request).await
            }
        }

        let gate = Arc::new(tokio::sync::Notify::new());
        let inner = ScriptedProvider::new();
        inner.push_proof(B256::repeat_byte(0xaa));
        let provider = Arc::new(GatedProvider {
            gate: gate.clone(),
            inner,
        });

        let config = ChainConfig::local();
        let flow = Arc::new(PurchaseFlow::new(
            FlowConfig::default(),
            ChainReader::new(chain.clone(), &config),
            ChainWriter::new(Arc::new(chain.wallet(buyer())), &config),
            TransactionMonitor::new(chain.clone(), &config),
            provider,
            TicketLedger::new(),
        ));

        flow.select_ticket(event_id, 0, 1).await.unwrap();

        let verifying = tokio::spawn({
            let flow = flow.clone();
            async move { flow.verify().await }
        });

        // let the verify call reach the provider, then dismiss the dialog
        tokio::task::yield_now().await;
        assert!(flow.is_in_flight());
        flow.reset();
        gate.notify_one();

        // the stale verify settles without touching the fresh flow
        let _ = verifying.await.unwrap();
        assert_eq!(flow.stage(), PurchaseStage::Select);
        assert!(flow.intent().proof.is_none());
        assert!(flow.last_error().is_none());
    }
}
