//! Client-side purchase ledger
//!
//! Best-effort, append-only cache of settled purchases for display. Not
//! authoritative: balances always come from the chain, and the whole
//! ledger is rebuildable from chain reads. Only the purchase flow appends
//! entries, and only on confirmed transactions.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{B256, U256};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A confirmed ticket holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTicket {
    pub ticket_type_id: U256,
    pub event_id: U256,
    /// Balance credited by this purchase
    pub balance: u64,
    /// Hash of the confirming transaction
    pub purchase_hash: B256,
    /// Unix seconds at confirmation
    pub purchase_date: u64,
}

/// A confirmed purchase transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: B256,
    pub event_id: U256,
    pub ticket_type_id: U256,
    pub quantity: u64,
    /// Native value paid, including the platform fee
    pub total_paid: U256,
    /// Unix seconds at confirmation
    pub timestamp: u64,
}

#[derive(Default)]
struct LedgerState {
    tickets: Vec<UserTicket>,
    transactions: Vec<TransactionRecord>,
}

/// Shared append-only ledger handle. Cloning is cheap and clones observe
/// the same entries.
#[derive(Clone, Default)]
pub struct TicketLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl TicketLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Record one confirmed purchase: exactly one ticket entry and one
    /// transaction entry.
    pub fn record_purchase(
        &self,
        event_id: U256,
        ticket_type_id: U256,
        quantity: u64,
        total_paid: U256,
        hash: B256,
    ) {
        let now = Self::now();
        let mut state = self.state.write();
        state.tickets.push(UserTicket {
            ticket_type_id,
            event_id,
            balance: quantity,
            purchase_hash: hash,
            purchase_date: now,
        });
        state.transactions.push(TransactionRecord {
            hash,
            event_id,
            ticket_type_id,
            quantity,
            total_paid,
            timestamp: now,
        });
    }

    /// Snapshot of ticket entries, oldest first.
    pub fn tickets(&self) -> Vec<UserTicket> {
        self.state.read().tickets.clone()
    }

    /// Snapshot of transaction entries, oldest first.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.read().transactions.clone()
    }

    /// Whether a transaction hash is already recorded.
    pub fn contains_transaction(&self, hash: B256) -> bool {
        self.state.read().transactions.iter().any(|t| t.hash == hash)
    }

    pub fn ticket_count(&self) -> usize {
        self.state.read().tickets.len()
    }

    /// Discard everything. Only meaningful on sign-out; the cache is
    /// rebuildable from chain reads.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.tickets.clear();
        state.transactions.clear();
    }
}
