//! Transaction orchestration for ledger-backed record dashboards.

pub mod config;
pub mod contract;
pub mod ledger;
pub mod orchestrator;
pub mod tx;

pub use config::GatewayConfig;
pub use contract::ContractBinding;
pub use ledger::{ChainError, ChainResult, NetworkClient, Receipt, Units};
pub use orchestrator::{BatchItem, BatchResult, ItemOutcome, Orchestrator, TransferRequest};
pub use tx::Credential;
