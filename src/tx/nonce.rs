//! Collision-free nonce allocation for one orchestration run.
//!
//! The account's transaction count is snapshotted exactly once when the
//! session opens; every subsequent allocation is local arithmetic.
//! Re-querying mid-session could observe a nonce already claimed by a
//! not-yet-confirmed transaction from the same run and hand it out twice.

use alloy::primitives::Address;

use crate::ledger::types::{ChainResult, LedgerRpc};

/// Monotonic nonce allocator for a single account, owned exclusively by
/// one orchestration run.
///
/// Exclusive ownership is the correctness boundary: two live sessions for
/// the same account would double-spend nonces, so a session is `&mut`
/// threaded through one run and dropped when the run finishes. Any later
/// batch opens a fresh session.
#[derive(Debug)]
pub struct NonceSession {
    address: Address,
    base_nonce: u64,
    allocated: u64,
}

impl NonceSession {
    /// Open a session by querying the network once for the account's
    /// current transaction count.
    pub async fn open(network: &dyn LedgerRpc, address: Address) -> ChainResult<Self> {
        let base_nonce = network.transaction_count(address).await?;
        tracing::debug!(address = %address, base_nonce, "Nonce session opened");
        Ok(Self {
            address,
            base_nonce,
            allocated: 0,
        })
    }

    /// Allocate the next nonce. Pure local arithmetic; never re-queries.
    pub fn next(&mut self) -> u64 {
        let nonce = self.base_nonce + self.allocated;
        self.allocated += 1;
        nonce
    }

    /// The account this session allocates for.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The transaction count observed when the session opened.
    pub fn base_nonce(&self) -> u64 {
        self.base_nonce
    }

    /// How many nonces have been handed out so far.
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    #[cfg(test)]
    pub(crate) fn with_base(address: Address, base_nonce: u64) -> Self {
        Self {
            address,
            base_nonce,
            allocated: 0,
        }
    }
}
