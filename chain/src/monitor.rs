//! Transaction confirmation monitor
//!
//! Bounded receipt polling with an explicit deadline. The result is a
//! tri-state: `Confirmed`, `Reverted`, or `Unconfirmed` when the wait
//! budget runs out — an unconfirmed transaction may still land later, so
//! the caller must not present it as failed.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::B256;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::ChainConfig;
use crate::errors::ChainResult;
use crate::rpc::ChainRpc;
use crate::types::{ConfirmationStatus, TxReceipt};

/// Polls a transaction hash until terminal or out of budget.
#[derive(Clone)]
pub struct TransactionMonitor {
    rpc: Arc<dyn ChainRpc>,
    poll_interval: Duration,
    confirm_timeout: Duration,
}

impl TransactionMonitor {
    pub fn new(rpc: Arc<dyn ChainRpc>, config: &ChainConfig) -> Self {
        Self {
            rpc,
            poll_interval: config.poll_interval,
            confirm_timeout: config.confirm_timeout,
        }
    }

    fn status_of(receipt: TxReceipt) -> ConfirmationStatus {
        if receipt.status {
            ConfirmationStatus::Confirmed {
                block_number: receipt.block_number,
            }
        } else {
            ConfirmationStatus::Reverted
        }
    }

    /// Poll until the transaction is terminal or the wait budget is spent.
    ///
    /// Transient transport failures inside the window are tolerated and
    /// retried; only the deadline turns them into `Unconfirmed`.
    pub async fn monitor(&self, hash: B256) -> ChainResult<ConfirmationStatus> {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            match self.rpc.transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    let status = Self::status_of(receipt);
                    info!(%hash, ?status, "transaction terminal");
                    return Ok(status);
                }
                Ok(None) => {
                    debug!(%hash, "no receipt yet");
                }
                Err(e) if e.is_retryable() => {
                    warn!(%hash, error = %e, "receipt fetch failed, retrying");
                }
                Err(e) => return Err(e),
            }

            if Instant::now() + self.poll_interval > deadline {
                info!(%hash, budget_secs = self.confirm_timeout.as_secs(), "confirmation window exhausted");
                return Ok(ConfirmationStatus::Unconfirmed);
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Single-shot status probe for the "check again later" path.
    pub async fn check_once(&self, hash: B256) -> ChainResult<ConfirmationStatus> {
        match self.rpc.transaction_receipt(hash).await? {
            Some(receipt) => Ok(Self::status_of(receipt)),
            None => Ok(ConfirmationStatus::Unconfirmed),
        }
    }
}
