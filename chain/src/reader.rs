//! Read-only contract queries
//!
//! All operations are idempotent and side-effect-free. Transport failures
//! surface as `ChainError::Unavailable` (retryable); a valid zero-sentinel
//! answer surfaces as the matching `*NotFound` error (not retryable).

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use tracing::{debug, warn};

use crate::abi::{self, Token};
use crate::config::ChainConfig;
use crate::errors::{ChainError, ChainResult};
use crate::rpc::ChainRpc;
use crate::types::{EventRecord, TicketType};

/// Typed read surface over the ticketing contract.
#[derive(Clone)]
pub struct ChainReader {
    rpc: Arc<dyn ChainRpc>,
    contract: Address,
    fallback_fee_bps: u16,
}

impl ChainReader {
    pub fn new(rpc: Arc<dyn ChainRpc>, config: &ChainConfig) -> Self {
        Self {
            rpc,
            contract: config.contract_address,
            fallback_fee_bps: config.fallback_fee_bps,
        }
    }

    /// Fetch an event by id.
    pub async fn get_event(&self, event_id: U256) -> ChainResult<EventRecord> {
        let data = abi::encode_call(abi::SIG_GET_EVENT, &[Token::Uint(event_id)]);
        let ret = self.rpc.call(self.contract, data).await?;
        let dec = abi::Decoder::new(&ret);

        let organizer = dec.address(1)?;
        if organizer == Address::ZERO {
            return Err(ChainError::EventNotFound(event_id.to_string()));
        }

        Ok(EventRecord {
            id: dec.uint(0)?,
            organizer,
            name: dec.string_at(dec.offset(2)?)?,
            ticket_type_ids: dec.uint_array_at(dec.offset(3)?)?,
            active: dec.bool_at(4)?,
        })
    }

    /// Fetch a ticket type by id.
    pub async fn get_ticket_type(&self, ticket_type_id: U256) -> ChainResult<TicketType> {
        let data = abi::encode_call(abi::SIG_GET_TICKET_TYPE, &[Token::Uint(ticket_type_id)]);
        let ret = self.rpc.call(self.contract, data).await?;
        let dec = abi::Decoder::new(&ret);

        let event_id = dec.uint(1)?;
        let max_supply = dec.u64(4)?;
        if event_id.is_zero() && max_supply == 0 {
            return Err(ChainError::TicketTypeNotFound(ticket_type_id.to_string()));
        }

        Ok(TicketType {
            id: dec.uint(0)?,
            event_id,
            name: dec.string_at(dec.offset(2)?)?,
            price: dec.uint(3)?,
            max_supply,
            current_supply: dec.u64(5)?,
            ipfs_hash: dec.string_at(dec.offset(6)?)?,
        })
    }

    /// Authoritative replay check for a `(event, nullifier)` pair.
    ///
    /// Must be consulted strictly before transaction submission. A final
    /// race remains possible; the contract reverting in that window is an
    /// expected outcome, not a client bug.
    pub async fn is_verified(&self, event_id: U256, nullifier_hash: B256) -> ChainResult<bool> {
        let data = abi::encode_call(
            abi::SIG_IS_VERIFIED,
            &[Token::Uint(event_id), Token::FixedBytes(nullifier_hash)],
        );
        let ret = self.rpc.call(self.contract, data).await?;
        let verified = abi::Decoder::new(&ret).bool_at(0)?;
        debug!(%event_id, %nullifier_hash, verified, "replay check");
        Ok(verified)
    }

    /// ERC-1155 balance of `owner` for a ticket type.
    pub async fn get_user_ticket_balance(
        &self,
        owner: Address,
        ticket_type_id: U256,
    ) -> ChainResult<u64> {
        let data = abi::encode_call(
            abi::SIG_BALANCE_OF,
            &[Token::Address(owner), Token::Uint(ticket_type_id)],
        );
        let ret = self.rpc.call(self.contract, data).await?;
        abi::Decoder::new(&ret).u64(0)
    }

    /// Platform fee in basis points.
    ///
    /// Falls back to the configured conservative default when the read
    /// fails, so price estimates never silently under-charge.
    pub async fn platform_fee_bps(&self) -> u16 {
        let data = abi::encode_call(abi::SIG_PLATFORM_FEE_BPS, &[]);
        match self.rpc.call(self.contract, data).await {
            Ok(ret) => match abi::Decoder::new(&ret).u16(0) {
                Ok(bps) => bps,
                Err(e) => {
                    warn!(error = %e, fallback = self.fallback_fee_bps, "fee decode failed");
                    self.fallback_fee_bps
                }
            },
            Err(e) => {
                warn!(error = %e, fallback = self.fallback_fee_bps, "fee read failed");
                self.fallback_fee_bps
            }
        }
    }

    /// Platform fee for a total ticket price.
    pub async fn fee_for(&self, total_price: U256) -> ChainResult<U256> {
        let bps = U256::from(self.platform_fee_bps().await);
        total_price
            .checked_mul(bps)
            .map(|v| v / U256::from(10_000u64))
            .ok_or_else(|| ChainError::ValueOverflow("fee calculation".into()))
    }
}
