//! Contract-facing data types

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// An event as stored by the ticketing contract.
///
/// Identity is immutable after creation; only the `active` flag toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Contract-assigned event id
    pub id: U256,
    /// Organizer address (creator of the event)
    pub organizer: Address,
    /// Display name
    pub name: String,
    /// Ticket type ids belonging to this event, in creation order
    pub ticket_type_ids: Vec<U256>,
    /// Whether ticket sales are open
    pub active: bool,
}

impl EventRecord {
    /// Resolve a ticket-type index into its contract-level id.
    pub fn ticket_type_id(&self, index: usize) -> Option<U256> {
        self.ticket_type_ids.get(index).copied()
    }
}

/// A ticket type (ERC-1155 token id) within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    /// Token id
    pub id: U256,
    /// Owning event
    pub event_id: U256,
    /// Display name
    pub name: String,
    /// Price per ticket in the smallest currency unit
    pub price: U256,
    /// Maximum mintable supply
    pub max_supply: u64,
    /// Tickets minted so far; monotonically increasing
    pub current_supply: u64,
    /// IPFS hash of the ticket metadata
    pub ipfs_hash: String,
}

impl TicketType {
    /// Remaining mintable supply.
    pub fn remaining(&self) -> u64 {
        self.max_supply.saturating_sub(self.current_supply)
    }

    /// Whether no further tickets can be minted.
    pub fn is_sold_out(&self) -> bool {
        self.current_supply >= self.max_supply
    }

    /// Whether `quantity` tickets can still be minted.
    pub fn can_mint(&self, quantity: u64) -> bool {
        self.current_supply
            .checked_add(quantity)
            .map(|total| total <= self.max_supply)
            .unwrap_or(false)
    }

    /// Total price for `quantity` tickets, if it fits in a U256.
    pub fn total_price(&self, quantity: u64) -> Option<U256> {
        self.price.checked_mul(U256::from(quantity))
    }
}

/// Outcome of submitting a transaction for broadcast.
///
/// `success == true` means only that the node accepted the transaction;
/// confirmation is the monitor's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Transaction hash, zero when submission failed before broadcast
    pub hash: B256,
    /// Accepted for broadcast
    pub success: bool,
    /// Rejection detail when not accepted
    pub error: Option<String>,
}

impl TransactionResult {
    pub fn accepted(hash: B256) -> Self {
        Self {
            hash,
            success: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            hash: B256::ZERO,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A state-changing call handed to the wallet bridge for signing and
/// broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    /// Contract to call
    pub to: Address,
    /// ABI-encoded calldata
    pub data: Bytes,
    /// Native value attached to the call
    pub value: U256,
}

/// A mined transaction receipt, reduced to what the monitor needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Execution status: true = success, false = reverted
    pub status: bool,
    /// Block the transaction was included in
    pub block_number: u64,
}

/// Terminal-or-not confirmation status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Mined and executed successfully
    Confirmed { block_number: u64 },
    /// Mined but execution reverted
    Reverted,
    /// No receipt within the wait budget; the transaction may still land
    Unconfirmed,
}

impl ConfirmationStatus {
    /// Whether the chain has given a final answer for this hash.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConfirmationStatus::Unconfirmed)
    }
}
