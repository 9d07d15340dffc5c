//! Ticket purchase core
//!
//! The verification-and-settlement flow: a per-dialog state machine
//! ([`flow::PurchaseFlow`]) that acquires a personhood proof, enforces
//! the one-purchase-per-identity rule against the chain, submits the
//! purchase transaction and waits for confirmation, and an append-only
//! client-side ledger ([`ledger::TicketLedger`]) of settled purchases.

pub mod errors;
pub mod flow;
pub mod intent;
pub mod ledger;

pub use errors::{PurchaseError, PurchaseResult};
pub use flow::{FlowConfig, PurchaseFlow, PurchaseStage};
pub use intent::PurchaseIntent;
pub use ledger::{TicketLedger, TransactionRecord, UserTicket};
