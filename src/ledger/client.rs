//! Ledger RPC client with failover, timeouts, and failure classification.
//!
//! # Responsibilities
//! - Connect to one or more JSON-RPC endpoints
//! - Classify failures: transport trouble vs. node refusal vs. revert
//! - Provide a health probe for ledger connectivity
//!
//! Refusals are never retried on a failover endpoint: a node that rejects
//! a transaction has answered. Only transport failures move to the next
//! provider.

use alloy::consensus::TxReceipt as _;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{RpcError, TransportErrorKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::NetworkConfig;
use crate::ledger::types::{ChainError, ChainResult, LedgerRpc, LogEntry, Receipt};

/// Shared handle to the ledger network.
///
/// Constructed once per process and passed by reference into every
/// component that talks to the network; there is no hidden global
/// connection state.
#[derive(Clone)]
pub struct NetworkClient {
    /// Primary provider followed by failovers.
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    config: NetworkConfig,
    timeout_duration: Duration,
}

impl NetworkClient {
    /// Connect to the configured endpoints.
    ///
    /// Startup verifies the reported chain id against configuration but
    /// only warns on mismatch, so the process can come up while the
    /// network is degraded.
    pub async fn new(config: NetworkConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::NetworkUnavailable(format!("invalid RPC URL '{}': {e}", config.rpc_url))
        })?;
        providers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary)) as Arc<dyn Provider + Send + Sync>
        );

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url))
                    as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.chain_id().await {
            Ok(id) if id != config.chain_id => {
                tracing::warn!(
                    expected = config.chain_id,
                    actual = id,
                    "Connected ledger reports a different chain id"
                );
            }
            Ok(_) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Ledger client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Ledger client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Run a read-only query against each provider in turn.
    async fn read<T, F, Fut>(&self, what: &str, op: F) -> ChainResult<T>
    where
        F: Fn(Arc<dyn Provider + Send + Sync>) -> Fut,
        Fut: std::future::Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::NetworkUnavailable(format!(
            "all RPC providers failed to {what}"
        )))
    }

    /// Chain id reported by the network.
    pub async fn chain_id(&self) -> ChainResult<u64> {
        self.read("get chain id", |p| async move { p.get_chain_id().await })
            .await
    }

    /// Native-token balance of an address, in atomic units.
    pub async fn balance(&self, address: Address) -> ChainResult<U256> {
        self.read("get balance", move |p| async move {
            p.get_balance(address).await
        })
        .await
    }

    /// Whether the ledger answers a tip-block query.
    pub async fn is_healthy(&self) -> bool {
        self.block_number().await.is_ok()
    }

    /// Number of confirmation blocks this deployment requires.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

#[async_trait::async_trait]
impl LedgerRpc for NetworkClient {
    async fn transaction_count(&self, address: Address) -> ChainResult<u64> {
        self.read("get transaction count", move |p| async move {
            p.get_transaction_count(address).await
        })
        .await
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.read("get gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> ChainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.estimate_gas(tx.clone())).await {
                Ok(Ok(gas)) => return Ok(gas),
                // The node executed the simulation and reports the call
                // would revert; do not fail over, the answer is final.
                Ok(Err(e)) if e.as_error_resp().is_some() => {
                    let resp = e.as_error_resp().map(|p| p.message.to_string());
                    return Err(ChainError::SimulationReverted(resp.unwrap_or_default()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::NetworkUnavailable(
            "all RPC providers failed to estimate gas".to_string(),
        ))
    }

    async fn call(&self, tx: &TransactionRequest) -> ChainResult<Bytes> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.call(tx.clone())).await {
                Ok(Ok(data)) => return Ok(data),
                Ok(Err(e)) if e.as_error_resp().is_some() => {
                    let resp = e.as_error_resp().map(|p| p.message.to_string());
                    return Err(ChainError::SimulationReverted(resp.unwrap_or_default()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::NetworkUnavailable(
            "all RPC providers failed to execute call".to_string(),
        ))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.send_raw_transaction(raw)).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                // The node received the payload and refused it. The same
                // signed bytes would be refused everywhere; surface it.
                Ok(Err(e)) if e.as_error_resp().is_some() => {
                    let resp = e.as_error_resp().map(|p| p.message.to_string());
                    return Err(ChainError::Rejected(resp.unwrap_or_default()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::NetworkUnavailable(
            "all RPC providers failed to broadcast".to_string(),
        ))
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<Receipt>> {
        let receipt = self
            .read("get receipt", move |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.map(convert_receipt))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.read("get block number", |p| async move {
            p.get_block_number().await
        })
        .await
    }
}

/// Map the RPC receipt shape into the crate-owned [`Receipt`].
fn convert_receipt(r: alloy::rpc::types::TransactionReceipt) -> Receipt {
    let logs = r
        .inner
        .logs()
        .iter()
        .map(|log| LogEntry {
            address: log.inner.address,
            topics: log.inner.data.topics().to_vec(),
            data: log.inner.data.data.clone(),
        })
        .collect();

    Receipt {
        tx_hash: r.transaction_hash,
        block_number: r.block_number.unwrap_or_default(),
        gas_used: r.gas_used,
        success: r.status(),
        logs,
    }
}

impl std::fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
