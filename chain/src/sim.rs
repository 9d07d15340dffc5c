//! In-memory simulated chain
//!
//! A miniature ticketing contract behind the `ChainRpc` and `WalletBridge`
//! seams. Serves the same purpose as the in-memory propagator/state
//! provider pairs elsewhere in the stack: deterministic tests and demos
//! without a node. Transactions execute synchronously on broadcast and
//! leave ordinary receipts, including reverted ones.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::abi::{self, Decoder};
use crate::errors::{ChainError, ChainResult};
use crate::rpc::ChainRpc;
use crate::types::{EventRecord, TicketType, TxReceipt, TxRequest};
use crate::writer::WalletBridge;

#[derive(Default)]
struct SimState {
    events: HashMap<U256, EventRecord>,
    ticket_types: HashMap<U256, TicketType>,
    verified: HashSet<(U256, B256)>,
    balances: HashMap<(Address, U256), u64>,
    receipts: HashMap<B256, TxReceipt>,
    next_event_id: u64,
    next_ticket_type_id: u64,
    fee_bps: Option<u16>,
    block_number: u64,
    nonce: u64,
    // Fault injection
    reads_unavailable: bool,
    fee_read_fails: bool,
    withhold_receipts: bool,
    revert_next_purchase: bool,
    reject_next_submission: Option<String>,
}

/// Simulated ticketing contract plus node.
pub struct SimulatedChain {
    state: Mutex<SimState>,
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                next_event_id: 1,
                next_ticket_type_id: 1,
                fee_bps: Some(100),
                block_number: 1,
                ..SimState::default()
            }),
        }
    }

    /// Wallet bridge for `account`, broadcasting into this chain.
    pub fn wallet(self: &Arc<Self>, account: Address) -> SimulatedWallet {
        SimulatedWallet {
            chain: Arc::clone(self),
            account: Some(account),
        }
    }

    /// Wallet bridge with no signed-in account.
    pub fn signed_out_wallet(self: &Arc<Self>) -> SimulatedWallet {
        SimulatedWallet {
            chain: Arc::clone(self),
            account: None,
        }
    }

    // --- test/demo state seeding -----------------------------------------

    /// Seed an event directly, bypassing transactions.
    pub fn seed_event(&self, organizer: Address, name: &str, active: bool) -> U256 {
        let mut state = self.state.lock();
        let id = U256::from(state.next_event_id);
        state.next_event_id += 1;
        state.events.insert(
            id,
            EventRecord {
                id,
                organizer,
                name: name.to_string(),
                ticket_type_ids: Vec::new(),
                active,
            },
        );
        id
    }

    /// Seed a ticket type under an event, bypassing transactions.
    pub fn seed_ticket_type(
        &self,
        event_id: U256,
        price: U256,
        max_supply: u64,
        current_supply: u64,
    ) -> U256 {
        let mut state = self.state.lock();
        let id = U256::from(state.next_ticket_type_id);
        state.next_ticket_type_id += 1;
        state.ticket_types.insert(
            id,
            TicketType {
                id,
                event_id,
                name: format!("tier-{id}"),
                price,
                max_supply,
                current_supply,
                ipfs_hash: format!("Qm{id}"),
            },
        );
        if let Some(event) = state.events.get_mut(&event_id) {
            event.ticket_type_ids.push(id);
        }
        id
    }

    /// Mark a nullifier as already consumed for an event.
    pub fn seed_verified(&self, event_id: U256, nullifier_hash: B256) {
        self.state.lock().verified.insert((event_id, nullifier_hash));
    }

    // --- fault injection --------------------------------------------------

    /// Make every read fail with a transport error.
    pub fn set_reads_unavailable(&self, unavailable: bool) {
        self.state.lock().reads_unavailable = unavailable;
    }

    /// Make only the platform-fee read fail.
    pub fn set_fee_read_fails(&self, fails: bool) {
        self.state.lock().fee_read_fails = fails;
    }

    /// Suppress receipts so transactions never confirm.
    pub fn set_withhold_receipts(&self, withhold: bool) {
        self.state.lock().withhold_receipts = withhold;
    }

    /// Force the next purchase transaction to revert on-chain.
    pub fn revert_next_purchase(&self) {
        self.state.lock().revert_next_purchase = true;
    }

    /// Make the node reject the next submission before broadcast.
    pub fn reject_next_submission(&self, reason: &str) {
        self.state.lock().reject_next_submission = Some(reason.to_string());
    }

    // --- direct inspection ------------------------------------------------

    pub fn ticket_type(&self, id: U256) -> Option<TicketType> {
        self.state.lock().ticket_types.get(&id).cloned()
    }

    pub fn balance_of(&self, owner: Address, ticket_type_id: U256) -> u64 {
        *self
            .state
            .lock()
            .balances
            .get(&(owner, ticket_type_id))
            .unwrap_or(&0)
    }

    // --- contract execution ----------------------------------------------

    fn handle_call(state: &SimState, calldata: &[u8]) -> ChainResult<Vec<u8>> {
        let (sel, args) = abi::strip_selector(calldata)?;
        let dec = Decoder::new(args);

        if sel == abi::selector(abi::SIG_GET_EVENT) {
            let id = dec.uint(0)?;
            let tokens = match state.events.get(&id) {
                Some(ev) => vec![
                    abi::Token::Uint(ev.id),
                    abi::Token::Address(ev.organizer),
                    abi::Token::String(ev.name.clone()),
                    abi::Token::UintArray(ev.ticket_type_ids.clone()),
                    abi::Token::Bool(ev.active),
                ],
                None => vec![
                    abi::Token::Uint(U256::ZERO),
                    abi::Token::Address(Address::ZERO),
                    abi::Token::String(String::new()),
                    abi::Token::UintArray(Vec::new()),
                    abi::Token::Bool(false),
                ],
            };
            return Ok(abi::encode_tokens(&tokens));
        }

        if sel == abi::selector(abi::SIG_GET_TICKET_TYPE) {
            let id = dec.uint(0)?;
            let tokens = match state.ticket_types.get(&id) {
                Some(t) => vec![
                    abi::Token::Uint(t.id),
                    abi::Token::Uint(t.event_id),
                    abi::Token::String(t.name.clone()),
                    abi::Token::Uint(t.price),
                    abi::Token::Uint(U256::from(t.max_supply)),
                    abi::Token::Uint(U256::from(t.current_supply)),
                    abi::Token::String(t.ipfs_hash.clone()),
                ],
                None => vec![
                    abi::Token::Uint(U256::ZERO),
                    abi::Token::Uint(U256::ZERO),
                    abi::Token::String(String::new()),
                    abi::Token::Uint(U256::ZERO),
                    abi::Token::Uint(U256::ZERO),
                    abi::Token::Uint(U256::ZERO),
                    abi::Token::String(String::new()),
                ],
            };
            return Ok(abi::encode_tokens(&tokens));
        }

        if sel == abi::selector(abi::SIG_IS_VERIFIED) {
            let key = (dec.uint(0)?, dec.b256(1)?);
            let verified = state.verified.contains(&key);
            return Ok(abi::encode_tokens(&[abi::Token::Bool(verified)]));
        }

        if sel == abi::selector(abi::SIG_BALANCE_OF) {
            let key = (dec.address(0)?, dec.uint(1)?);
            let balance = *state.balances.get(&key).unwrap_or(&0);
            return Ok(abi::encode_tokens(&[abi::Token::Uint(U256::from(balance))]));
        }

        if sel == abi::selector(abi::SIG_PLATFORM_FEE_BPS) {
            if state.fee_read_fails {
                return Err(ChainError::Unavailable("fee oracle offline".into()));
            }
            let bps = state.fee_bps.unwrap_or(0);
            return Ok(abi::encode_tokens(&[abi::Token::Uint(U256::from(bps))]));
        }

        Err(ChainError::Codec(format!("unknown selector {}", hex::encode(sel))))
    }

    fn execute(state: &mut SimState, from: Address, request: &TxRequest) -> Result<(), String> {
        let (sel, args) = abi::strip_selector(&request.data).map_err(|e| e.to_string())?;
        let dec = Decoder::new(args);

        if sel == abi::selector(abi::SIG_CREATE_EVENT) {
            let name = dec
                .offset(0)
                .and_then(|o| dec.string_at(o))
                .map_err(|e| e.to_string())?;
            let id = U256::from(state.next_event_id);
            state.next_event_id += 1;
            state.events.insert(
                id,
                EventRecord {
                    id,
                    organizer: from,
                    name,
                    ticket_type_ids: Vec::new(),
                    active: true,
                },
            );
            return Ok(());
        }

        if sel == abi::selector(abi::SIG_CREATE_TICKET_TYPE) {
            let event_id = dec.uint(0).map_err(|e| e.to_string())?;
            let event = state
                .events
                .get(&event_id)
                .ok_or("unknown event")?
                .clone();
            if event.organizer != from {
                return Err("not the organizer".into());
            }
            let price = dec.uint(1).map_err(|e| e.to_string())?;
            let max_supply = dec.u64(2).map_err(|e| e.to_string())?;
            let name = dec
                .offset(3)
                .and_then(|o| dec.string_at(o))
                .map_err(|e| e.to_string())?;
            let ipfs_hash = dec
                .offset(4)
                .and_then(|o| dec.string_at(o))
                .map_err(|e| e.to_string())?;

            let id = U256::from(state.next_ticket_type_id);
            state.next_ticket_type_id += 1;
            state.ticket_types.insert(
                id,
                TicketType {
                    id,
                    event_id,
                    name,
                    price,
                    max_supply,
                    current_supply: 0,
                    ipfs_hash,
                },
            );
            state
                .events
                .get_mut(&event_id)
                .expect("event existence checked above")
                .ticket_type_ids
                .push(id);
            return Ok(());
        }

        if sel == abi::selector(abi::SIG_PURCHASE_TICKET) {
            if state.revert_next_purchase {
                state.revert_next_purchase = false;
                return Err("forced revert".into());
            }
            let event_id = dec.uint(0).map_err(|e| e.to_string())?;
            let type_index = dec.u64(1).map_err(|e| e.to_string())? as usize;
            let quantity = dec.u64(2).map_err(|e| e.to_string())?;
            let nullifier = dec.b256(5).map_err(|e| e.to_string())?;

            let event = state.events.get(&event_id).ok_or("unknown event")?;
            if !event.active {
                return Err("event inactive".into());
            }
            let ticket_type_id = *event
                .ticket_type_ids
                .get(type_index)
                .ok_or("bad ticket type index")?;
            if state.verified.contains(&(event_id, nullifier)) {
                return Err("nullifier already used".into());
            }

            let ticket = state
                .ticket_types
                .get(&ticket_type_id)
                .ok_or("unknown ticket type")?;
            if !ticket.can_mint(quantity) {
                return Err("sold out".into());
            }
            let total = ticket.total_price(quantity).ok_or("price overflow")?;
            if request.value < total {
                return Err("insufficient payment".into());
            }

            state.verified.insert((event_id, nullifier));
            state
                .ticket_types
                .get_mut(&ticket_type_id)
                .expect("ticket type existence checked above")
                .current_supply += quantity;
            *state.balances.entry((from, ticket_type_id)).or_insert(0) += quantity;
            return Ok(());
        }

        if sel == abi::selector(abi::SIG_TOGGLE_EVENT_STATUS) {
            let event_id = dec.uint(0).map_err(|e| e.to_string())?;
            let event = state.events.get_mut(&event_id).ok_or("unknown event")?;
            if event.organizer != from {
                return Err("not the organizer".into());
            }
            event.active = !event.active;
            return Ok(());
        }

        Err(format!("unknown selector {}", hex::encode(sel)))
    }

    fn broadcast(&self, from: Address, request: TxRequest) -> Result<B256, String> {
        let mut state = self.state.lock();

        if let Some(reason) = state.reject_next_submission.take() {
            return Err(reason);
        }

        state.nonce += 1;
        let mut preimage = state.nonce.to_be_bytes().to_vec();
        preimage.extend_from_slice(&request.data);
        let hash = keccak256(&preimage);

        let status = Self::execute(&mut state, from, &request).is_ok();
        state.block_number += 1;
        let block_number = state.block_number;
        state.receipts.insert(
            hash,
            TxReceipt {
                status,
                block_number,
            },
        );
        Ok(hash)
    }
}

#[async_trait]
impl ChainRpc for SimulatedChain {
    async fn call(&self, _to: Address, data: Bytes) -> ChainResult<Bytes> {
        let state = self.state.lock();
        if state.reads_unavailable {
            return Err(ChainError::Unavailable("simulated outage".into()));
        }
        Self::handle_call(&state, &data).map(Bytes::from)
    }

    async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<TxReceipt>> {
        let state = self.state.lock();
        if state.withhold_receipts {
            return Ok(None);
        }
        Ok(state.receipts.get(&hash).cloned())
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(31337)
    }
}

/// Wallet bridge broadcasting into a [`SimulatedChain`].
pub struct SimulatedWallet {
    chain: Arc<SimulatedChain>,
    account: Option<Address>,
}

#[async_trait]
impl WalletBridge for SimulatedWallet {
    fn current_account(&self) -> Option<Address> {
        self.account
    }

    async fn send_transaction(&self, request: TxRequest) -> Result<B256, String> {
        let from = self.account.ok_or("no account")?;
        self.chain.broadcast(from, request)
    }
}
