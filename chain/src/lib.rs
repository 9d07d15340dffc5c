//! Typed access to the Noscalp ticketing contract
//!
//! Split along the read/write/confirm seams:
//!
//! - [`reader::ChainReader`] — idempotent queries (events, ticket types,
//!   replay checks, balances, platform fee)
//! - [`writer::ChainWriter`] — state-changing calls, signed and broadcast
//!   by the host wallet behind [`writer::WalletBridge`]
//! - [`monitor::TransactionMonitor`] — bounded receipt polling with a
//!   tri-state outcome
//! - [`sim::SimulatedChain`] — in-memory contract for tests and demos

pub mod abi;
pub mod config;
pub mod errors;
pub mod monitor;
pub mod reader;
pub mod rpc;
pub mod sim;
pub mod types;
pub mod writer;

pub use config::ChainConfig;
pub use errors::{ChainError, ChainResult};
pub use monitor::TransactionMonitor;
pub use reader::ChainReader;
pub use rpc::{ChainRpc, HttpChainRpc};
pub use sim::{SimulatedChain, SimulatedWallet};
pub use types::{
    ConfirmationStatus, EventRecord, TicketType, TransactionResult, TxReceipt, TxRequest,
};
pub use writer::{ChainWriter, WalletBridge, PROOF_ELEMENTS};
