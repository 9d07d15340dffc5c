//! JSON-RPC transport seam
//!
//! `ChainRpc` is the narrow boundary between the typed reader/monitor and
//! the node. The production implementation speaks Ethereum JSON-RPC over
//! the `jsonrpsee` HTTP client; tests and demos use the simulated chain.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::ChainConfig;
use crate::errors::{ChainError, ChainResult};
use crate::types::TxReceipt;

/// Read-side transport to a chain node.
///
/// Writes deliberately do not pass through here: state-changing calls are
/// signed and broadcast by the host wallet (see `writer::WalletBridge`).
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Execute a read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes>;

    /// Fetch the receipt for a transaction, `None` while unmined.
    async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<TxReceipt>>;

    /// The node's chain id.
    async fn chain_id(&self) -> ChainResult<u64>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallObject {
    to: Address,
    data: Bytes,
}

/// Receipt shape as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    status: String,
    block_number: String,
}

fn parse_hex_u64(value: &str) -> ChainResult<u64> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(stripped, 16)
        .map_err(|e| ChainError::Codec(format!("invalid hex quantity {value:?}: {e}")))
}

fn transport_error(err: ClientError, timeout_secs: u64) -> ChainError {
    match err {
        ClientError::RequestTimeout => ChainError::RpcTimeout(timeout_secs),
        other => ChainError::Unavailable(other.to_string()),
    }
}

/// Ethereum JSON-RPC backed transport.
pub struct HttpChainRpc {
    client: HttpClient,
    timeout_secs: u64,
}

impl HttpChainRpc {
    /// Connect to the node named by the configuration.
    pub fn new(config: &ChainConfig) -> ChainResult<Self> {
        config.validate()?;
        let client = HttpClientBuilder::default()
            .request_timeout(config.call_timeout)
            .build(&config.rpc_url)
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs: config.call_timeout.as_secs(),
        })
    }

    /// Verify the node is on the expected chain.
    pub async fn check_chain_id(&self, expected: u64) -> ChainResult<()> {
        let actual = self.chain_id().await?;
        if actual != expected {
            return Err(ChainError::InvalidConfig(format!(
                "node is on chain {actual}, expected {expected}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainRpc for HttpChainRpc {
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let call = CallObject { to, data };
        let result: String = self
            .client
            .request("eth_call", rpc_params![call, "latest"])
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        Bytes::from_str(&result)
            .map_err(|e| ChainError::Codec(format!("invalid call result: {e}")))
    }

    async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<TxReceipt>> {
        let receipt: Option<RpcReceipt> = self
            .client
            .request("eth_getTransactionReceipt", rpc_params![hash])
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        match receipt {
            None => Ok(None),
            Some(r) => Ok(Some(TxReceipt {
                status: parse_hex_u64(&r.status)? == 1,
                block_number: parse_hex_u64(&r.block_number)?,
            })),
        }
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        let id: String = self
            .client
            .request("eth_chainId", rpc_params![])
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        parse_hex_u64(&id)
    }
}
