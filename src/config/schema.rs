//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and
//! every field has a default so a minimal config (or none at all) works
//! against a local development node. Private keys are never part of the
//! schema; they come only from the environment.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Ledger network connection settings.
    pub network: NetworkConfig,

    /// Denomination of the ledger's native token.
    pub currency: CurrencyConfig,

    /// Gas defaults for the operator CLI.
    pub gas: GasConfig,
}

/// Ledger network connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Primary JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order on transport
    /// failures.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// Per-RPC-call timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Block depth required before a transaction counts as confirmed.
    /// Zero means the first receipt sighting resolves a broadcast.
    pub confirmation_blocks: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            confirmation_blocks: 3,
        }
    }
}

/// Denomination of the native token.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Atomic-unit exponent: human amounts carry at most this many
    /// fractional digits.
    pub decimals: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self { decimals: 18 }
    }
}

/// Gas defaults for the operator CLI.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    /// Default gas limit for plain value transfers.
    pub transfer_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            transfer_limit: 21_000,
        }
    }
}
