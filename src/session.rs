//! Session context
//!
//! An explicit, passable session object instead of a process-wide auth
//! store: created on sign-in, dropped on sign-out. The purchase flow
//! itself only ever needs the read-only current-account accessor exposed
//! through the wallet bridge.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::Address;
use tracing::info;

/// A signed-in wallet session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    account: Address,
    signed_in_at: u64,
}

impl SessionContext {
    /// Establish a session for a wallet account.
    pub fn sign_in(account: Address) -> Self {
        info!(%account, "session established");
        Self {
            account,
            signed_in_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// The account backing this session.
    pub fn account(&self) -> Address {
        self.account
    }

    /// Unix seconds when the session was established.
    pub fn signed_in_at(&self) -> u64 {
        self.signed_in_at
    }

    /// End the session. Consumes the context so no stale handle survives
    /// sign-out.
    pub fn sign_out(self) {
        info!(account = %self.account, "session ended");
    }
}
