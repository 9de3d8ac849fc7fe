//! Ledger network subsystem.
//!
//! # Data Flow
//! ```text
//! config (RPC URLs, chain id, timeouts)
//!     → client.rs (provider pool, failover, classification)
//!     → types.rs (ChainError taxonomy, Receipt, LedgerRpc seam)
//!     → units.rs (decimal string ↔ atomic U256)
//! ```
//!
//! # Security Constraints
//! - All RPC calls carry the configured timeout
//! - Node refusals are terminal; only transport failures fail over
//! - Nothing in this subsystem ever sees key material

pub mod client;
pub mod types;
pub mod units;

pub use client::NetworkClient;
pub use types::{parse_address, ChainError, ChainResult, LedgerRpc, LogEntry, Receipt};
pub use units::Units;
