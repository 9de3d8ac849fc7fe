//! Batch items and per-item outcome bookkeeping.

use serde::{Deserialize, Serialize};

use alloy::dyn_abi::DynSolValue;

use crate::contract::ContractBinding;
use crate::ledger::types::{ChainError, Receipt};

/// One requested value transfer: recipient address and human-denomination
/// amount, both as strings from the caller surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub to: String,
    pub amount: String,
}

/// One unit of work in a batch.
#[derive(Debug, Clone)]
pub enum BatchItem {
    /// Plain value transfer.
    Transfer(TransferRequest),
    /// Contract invocation through a binding.
    ContractCall {
        binding: ContractBinding,
        method: String,
        args: Vec<DynSolValue>,
    },
}

/// Pipeline stage an item was in when it failed.
///
/// `Build` and `Sign` failures mean nothing reached the network for that
/// item; a `Submit` failure means a signed transaction was broadcast (or
/// broadcasting was attempted) and the outcome is negative or uncertain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Sign,
    Submit,
}

/// Outcome of one batch item, in input order.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Broadcast and confirmed to the configured depth.
    Confirmed(Receipt),
    /// Failed at `stage` with the classified error.
    Failed { stage: Stage, error: ChainError },
    /// Skipped because an earlier item failed; zero network calls were
    /// made and its pre-allocated nonce was discarded unbroadcast.
    NotAttempted,
}

impl ItemOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::Confirmed(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// Ordered per-item outcomes of one batch run.
///
/// Outcome order always matches input order; items are processed serially
/// so completion order is input order as well.
#[derive(Debug)]
pub struct BatchResult {
    outcomes: Vec<ItemOutcome>,
}

impl BatchResult {
    pub(crate) fn new(outcomes: Vec<ItemOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<ItemOutcome> {
        self.outcomes
    }

    /// Number of items confirmed on-chain.
    pub fn confirmed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_confirmed()).count()
    }

    /// Index and error of the item that aborted the batch, if any.
    pub fn first_failure(&self) -> Option<(usize, &ChainError)> {
        self.outcomes.iter().enumerate().find_map(|(i, o)| match o {
            ItemOutcome::Failed { error, .. } => Some((i, error)),
            _ => None,
        })
    }

    pub fn all_confirmed(&self) -> bool {
        self.outcomes.iter().all(|o| o.is_confirmed())
    }
}
