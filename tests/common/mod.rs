//! Shared utilities for integration testing: a scripted ledger double.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;

use chain_gateway::config::GatewayConfig;
use chain_gateway::ledger::{ChainError, ChainResult, LedgerRpc, LogEntry, Receipt};

// Well-known Anvil test accounts.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const RECIPIENT_A: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
pub const RECIPIENT_B: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";
pub const RECIPIENT_C: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

/// Config pointed at nothing in particular; integration tests never open a
/// real connection.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.network.confirmation_blocks = 1;
    config
}

/// Scripted behavior for one `send_raw_transaction` call.
pub enum SendScript {
    /// Accept into the pool; receipt reports success.
    Accept,
    /// Refuse at the node with the given reason.
    Reject(String),
    /// Accept, but the receipt reports a contract revert.
    AcceptButRevert,
}

/// One transaction the mock received, decoded from its wire form.
///
/// Decoding the signed envelope (rather than trusting the caller's
/// bookkeeping) verifies that the signature bound the real field values.
pub struct SentTx {
    pub hash: TxHash,
    pub nonce: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
}

/// In-memory ledger double implementing the full RPC seam.
pub struct MockLedger {
    pub base_nonce: u64,
    pub price: u128,
    pub tip: u64,
    /// Scripted outcomes consumed per send; empty means Accept.
    send_script: Mutex<VecDeque<SendScript>>,
    /// `Err` reason for gas estimation, if simulation should revert.
    estimate_revert: Mutex<Option<String>>,
    /// Whether the nonce query should fail at the transport level.
    nonce_query_fails: bool,
    /// Canned return data for read-only calls.
    call_response: Mutex<Option<Bytes>>,
    /// Logs attached to every successful receipt.
    receipt_logs: Mutex<Vec<LogEntry>>,
    /// Every RPC method invoked, in order.
    pub calls: Mutex<Vec<&'static str>>,
    /// Every transaction received, in order.
    pub sent: Mutex<Vec<SentTx>>,
    /// Hashes whose receipts report failure.
    reverted: Mutex<Vec<TxHash>>,
    /// Hashes the node refused; they never gain a receipt.
    refused: Mutex<Vec<TxHash>>,
}

impl MockLedger {
    pub fn new(base_nonce: u64) -> Self {
        Self {
            base_nonce,
            price: 1_000_000_000,
            tip: 1_000,
            send_script: Mutex::new(VecDeque::new()),
            estimate_revert: Mutex::new(None),
            nonce_query_fails: false,
            call_response: Mutex::new(None),
            receipt_logs: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            reverted: Mutex::new(Vec::new()),
            refused: Mutex::new(Vec::new()),
        }
    }

    /// A ledger whose nonce query fails at the transport level.
    pub fn unreachable_for_nonces() -> Self {
        Self {
            nonce_query_fails: true,
            ..Self::new(0)
        }
    }

    pub fn script_sends(self, script: Vec<SendScript>) -> Self {
        *self.send_script.lock().unwrap() = script.into();
        self
    }

    pub fn with_estimate_revert(self, reason: &str) -> Self {
        *self.estimate_revert.lock().unwrap() = Some(reason.to_string());
        self
    }

    pub fn with_call_response(self, data: Vec<u8>) -> Self {
        *self.call_response.lock().unwrap() = Some(Bytes::from(data));
        self
    }

    pub fn with_receipt_logs(self, logs: Vec<LogEntry>) -> Self {
        *self.receipt_logs.lock().unwrap() = logs;
        self
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }

    /// Number of times an RPC method was invoked.
    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    /// Nonces of every transaction received, in arrival order.
    pub fn sent_nonces(&self) -> Vec<u64> {
        self.sent.lock().unwrap().iter().map(|t| t.nonce).collect()
    }
}

#[async_trait::async_trait]
impl LedgerRpc for MockLedger {
    async fn transaction_count(&self, _address: Address) -> ChainResult<u64> {
        self.record("transaction_count");
        if self.nonce_query_fails {
            return Err(ChainError::NetworkUnavailable(
                "all RPC providers failed to get transaction count".to_string(),
            ));
        }
        Ok(self.base_nonce)
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.record("gas_price");
        Ok(self.price)
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> ChainResult<u64> {
        self.record("estimate_gas");
        match &*self.estimate_revert.lock().unwrap() {
            Some(reason) => Err(ChainError::SimulationReverted(reason.clone())),
            None => Ok(50_000),
        }
    }

    async fn call(&self, _tx: &TransactionRequest) -> ChainResult<Bytes> {
        self.record("call");
        Ok(self
            .call_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash> {
        self.record("send_raw_transaction");

        let hash = keccak256(raw);
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .expect("mock received an undecodable wire form");
        self.sent.lock().unwrap().push(SentTx {
            hash,
            nonce: envelope.nonce(),
            to: envelope.to(),
            value: envelope.value(),
            input: envelope.input().clone(),
            gas_limit: envelope.gas_limit(),
        });

        let script = self
            .send_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SendScript::Accept);
        match script {
            SendScript::Accept => Ok(hash),
            SendScript::Reject(reason) => {
                self.refused.lock().unwrap().push(hash);
                Err(ChainError::Rejected(reason))
            }
            SendScript::AcceptButRevert => {
                self.reverted.lock().unwrap().push(hash);
                Ok(hash)
            }
        }
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<Receipt>> {
        self.record("transaction_receipt");

        if self.refused.lock().unwrap().contains(&tx_hash) {
            return Ok(None);
        }
        let known = self.sent.lock().unwrap().iter().any(|t| t.hash == tx_hash);
        if !known {
            return Ok(None);
        }

        let success = !self.reverted.lock().unwrap().contains(&tx_hash);
        let logs = if success {
            self.receipt_logs.lock().unwrap().clone()
        } else {
            Vec::new()
        };
        Ok(Some(Receipt {
            tx_hash,
            block_number: self.tip.saturating_sub(10),
            gas_used: 21_000,
            success,
            logs,
        }))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.record("block_number");
        Ok(self.tip)
    }
}
