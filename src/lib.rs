//! Noscalp: proof-of-personhood event ticketing client
//!
//! Root crate tying the components together and re-exporting them for
//! integration tests and host applications.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       PurchaseFlow                          │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐  ┌─────────────┐  ┌──────────────┐         │
//! │  │  Identity  │  │ ChainReader │  │ ChainWriter  │         │
//! │  │  Provider  │  │ (replay chk)│  │ (wallet sig) │         │
//! │  └─────┬──────┘  └──────┬──────┘  └──────┬───────┘         │
//! │        │                │                │                  │
//! │        └────────────────┼────────────────┘                  │
//! │                         │                                   │
//! │               ┌─────────▼──────────┐                        │
//! │               │ TransactionMonitor │                        │
//! │               └─────────┬──────────┘                        │
//! │                         │                                   │
//! │               ┌─────────▼──────────┐                        │
//! │               │    TicketLedger    │                        │
//! │               └────────────────────┘                        │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Organization
//!
//! - `noscalp-chain`: typed contract access (reader, writer, monitor,
//!   simulated chain)
//! - `noscalp-identity`: personhood proofs, signals, remote verification
//! - `noscalp-purchase`: the purchase state machine and ledger

pub mod session;

// Re-export component crates for integration tests and hosts
pub use noscalp_chain as chain;
pub use noscalp_identity as identity;
pub use noscalp_purchase as purchase;

/// Client library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::session::SessionContext;
    pub use noscalp_chain::{
        ChainConfig, ChainError, ChainReader, ChainWriter, ConfirmationStatus, SimulatedChain,
        TransactionMonitor, TransactionResult, WalletBridge,
    };
    pub use noscalp_identity::{
        IdentityProof, ProofErrorCode, ProofProvider, ProofResult, Signal, VerificationLevel,
    };
    pub use noscalp_purchase::{
        FlowConfig, PurchaseError, PurchaseFlow, PurchaseStage, TicketLedger,
    };
}
