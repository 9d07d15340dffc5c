//! Chain configuration
//!
//! The single authoritative source for contract address, chain id and
//! fee/timeout defaults. Nothing else in the workspace hardcodes these.

use std::time::Duration;

use alloy_primitives::{address, Address};

use crate::errors::{ChainError, ChainResult};

/// Deployed ticketing contract on World Chain mainnet
pub const MAINNET_CONTRACT: Address = address!("3c446c77e3ef2e9a88b9abd10c0aeb7fab4fcb3c");

/// Deployed ticketing contract on World Chain Sepolia
pub const TESTNET_CONTRACT: Address = address!("a0ee7a142d267c1f36714e4a8f75612f20a79720");

/// World Chain mainnet chain id
pub const MAINNET_CHAIN_ID: u64 = 480;

/// World Chain Sepolia chain id
pub const TESTNET_CHAIN_ID: u64 = 4801;

/// Conservative platform-fee fallback (2.5%) used when the on-chain fee
/// read fails, so UI estimates never under-charge.
pub const FALLBACK_FEE_BPS: u16 = 250;

/// Chain access configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Deployed ticketing contract address
    pub contract_address: Address,
    /// Expected chain id
    pub chain_id: u64,
    /// Platform fee fallback in basis points
    pub fallback_fee_bps: u16,
    /// Receipt poll interval
    pub poll_interval: Duration,
    /// Confirmation wait budget before reporting "unconfirmed"
    pub confirm_timeout: Duration,
    /// Per-request RPC timeout
    pub call_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainConfig {
    /// Configuration for World Chain mainnet
    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://worldchain-mainnet.g.alchemy.com/public".to_string(),
            contract_address: MAINNET_CONTRACT,
            chain_id: MAINNET_CHAIN_ID,
            fallback_fee_bps: FALLBACK_FEE_BPS,
            poll_interval: Duration::from_secs(2),
            confirm_timeout: Duration::from_secs(60),
            call_timeout: Duration::from_secs(10),
        }
    }

    /// Configuration for World Chain Sepolia
    pub fn testnet() -> Self {
        Self {
            rpc_url: "https://worldchain-sepolia.g.alchemy.com/public".to_string(),
            contract_address: TESTNET_CONTRACT,
            chain_id: TESTNET_CHAIN_ID,
            ..Self::mainnet()
        }
    }

    /// Configuration for a local development node
    pub fn local() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: TESTNET_CONTRACT,
            chain_id: 31337,
            poll_interval: Duration::from_millis(200),
            confirm_timeout: Duration::from_secs(10),
            ..Self::mainnet()
        }
    }

    /// Validate the configuration before use
    pub fn validate(&self) -> ChainResult<()> {
        if self.rpc_url.is_empty() {
            return Err(ChainError::InvalidConfig("empty rpc_url".into()));
        }
        if self.contract_address == Address::ZERO {
            return Err(ChainError::InvalidConfig("zero contract address".into()));
        }
        if self.chain_id == 0 {
            return Err(ChainError::InvalidConfig("zero chain id".into()));
        }
        if self.confirm_timeout.is_zero() || self.poll_interval.is_zero() {
            return Err(ChainError::InvalidConfig("zero timeout".into()));
        }
        if self.poll_interval > self.confirm_timeout {
            return Err(ChainError::InvalidConfig(
                "poll interval exceeds confirmation budget".into(),
            ));
        }
        Ok(())
    }
}
