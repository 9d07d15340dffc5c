//! Signal generation
//!
//! A signal binds a proof request to one purchase context so the proof
//! cannot be replayed elsewhere. Every attempt gets a fresh signal: the
//! event id, the ticket-type index, the wall-clock millisecond and a
//! random nonce.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::U256;
use rand::Rng;

/// A context-binding signal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signal(String);

impl Signal {
    /// Generate a fresh signal for one purchase attempt.
    pub fn generate(event_id: U256, ticket_type_index: u64) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let nonce: u64 = rand::thread_rng().gen();
        Self(format!(
            "{event_id}-{ticket_type_index}-{millis}-{nonce:016x}"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
