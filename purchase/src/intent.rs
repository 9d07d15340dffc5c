//! Ephemeral purchase intent
//!
//! One intent per flow instance. It lives exactly as long as the purchase
//! dialog that owns it and is replaced wholesale on reset.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{B256, U256};

use noscalp_identity::{IdentityProof, Signal};

/// Client-held state of one purchase attempt.
#[derive(Debug, Clone)]
pub struct PurchaseIntent {
    /// Event being purchased into
    pub event_id: U256,
    /// Index of the ticket type within the event
    pub ticket_type_index: u64,
    /// Resolved ticket-type id (token id)
    pub ticket_type_id: U256,
    /// Tickets requested
    pub quantity: u64,
    /// Context-binding signal for the current verification attempt
    pub signal: Option<Signal>,
    /// Proof obtained for the current signal
    pub proof: Option<IdentityProof>,
    /// Hash of the submitted purchase transaction
    pub transaction_hash: Option<B256>,
    /// Native value attached to the submitted transaction
    pub value_paid: Option<U256>,
    /// Unix seconds when the intent was created
    pub created_at: u64,
}

impl PurchaseIntent {
    pub fn new() -> Self {
        Self {
            event_id: U256::ZERO,
            ticket_type_index: 0,
            ticket_type_id: U256::ZERO,
            quantity: 0,
            signal: None,
            proof: None,
            transaction_hash: None,
            value_paid: None,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

impl Default for PurchaseIntent {
    fn default() -> Self {
        Self::new()
    }
}
