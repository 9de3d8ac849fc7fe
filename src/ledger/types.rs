//! Ledger-facing types: error taxonomy, receipts, and the RPC seam.

use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur anywhere in the transaction pipeline.
///
/// The validation variants (`InvalidAmount`, `InvalidAddress`,
/// `UnknownMethod`, `ArgumentTypeMismatch`) are raised before any nonce is
/// consumed and before any network call. The broadcast variants
/// (`Rejected`, `ExecutionReverted`) mean a signed transaction reached the
/// network; neither is retried automatically.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Amount string is not a valid decimal or carries more fractional
    /// digits than the ledger's atomic-unit exponent allows.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Address string does not parse as a ledger address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Local key material does not control the declared sender address.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// A delegated signing authority declined to sign.
    #[error("signing rejected: {0}")]
    SigningRejected(String),

    /// Method name is absent from the contract interface description.
    #[error("unknown contract method: {0}")]
    UnknownMethod(String),

    /// Supplied arguments disagree with the interface description.
    #[error("argument mismatch for {method}: {detail}")]
    ArgumentTypeMismatch { method: String, detail: String },

    /// Gas estimation predicted the call would revert; nothing was signed.
    #[error("simulation reverted: {0}")]
    SimulationReverted(String),

    /// Transport-level failure reaching the ledger network.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The network refused the transaction (nonce too low, insufficient
    /// balance, gas too low, ...). Nothing was mined.
    #[error("transaction rejected by network: {0}")]
    Rejected(String),

    /// The transaction was mined but contract logic aborted it. The nonce
    /// is consumed; this is a terminal outcome, not a transient fault.
    #[error("execution reverted: {0}")]
    ExecutionReverted(String),
}

/// Result type for pipeline operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Parse a ledger address, mapping failure to [`ChainError::InvalidAddress`].
pub fn parse_address(s: &str) -> ChainResult<Address> {
    s.parse()
        .map_err(|_| ChainError::InvalidAddress(s.to_string()))
}

/// The network's acknowledgment of a mined transaction.
///
/// Crate-owned (rather than the raw RPC receipt) so that event decoding and
/// test doubles work against one stable shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Transaction identifier.
    pub tx_hash: TxHash,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Gas consumed by execution.
    pub gas_used: u64,
    /// Whether execution succeeded.
    pub success: bool,
    /// Raw event logs emitted during execution.
    pub logs: Vec<LogEntry>,
}

/// One raw event log from a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event signature hash.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed fields.
    pub data: Bytes,
}

/// The operations this layer requires of a ledger network endpoint.
///
/// `NetworkClient` is the production implementation; tests substitute a
/// scripted mock. Write-path ordering constraints live in the callers:
/// only `send_raw_transaction` consumes a nonce.
#[async_trait::async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Number of transactions ever sent from `address` (the next nonce).
    async fn transaction_count(&self, address: Address) -> ChainResult<u64>;

    /// Current gas price in atomic units.
    async fn gas_price(&self) -> ChainResult<u128>;

    /// Simulated-execution gas cost for `tx`.
    ///
    /// Fails with [`ChainError::SimulationReverted`] when the node reports
    /// the call would revert.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> ChainResult<u64>;

    /// Read-only contract call; returns the ABI-encoded return data.
    async fn call(&self, tx: &TransactionRequest) -> ChainResult<Bytes>;

    /// Submit a signed wire-form transaction to the pending pool.
    ///
    /// Fails with [`ChainError::Rejected`] when the node refuses it.
    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash>;

    /// Receipt for a transaction, or `None` while it is still pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<Receipt>>;

    /// Latest block number.
    async fn block_number(&self) -> ChainResult<u64>;
}
