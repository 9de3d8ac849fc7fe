//! Per-transaction pipeline: nonce allocation, building, signing,
//! broadcast.
//!
//! # Data Flow
//! ```text
//! NonceSession (one network snapshot per orchestration run)
//!     → builder.rs (validated UnsignedTransaction, nonce assigned once)
//!     → signer.rs (local key or delegated authority → wire form)
//!     → broadcast.rs (submit, classify, confirm)
//! ```

pub mod broadcast;
pub mod builder;
pub mod nonce;
pub mod signer;

pub use builder::{FeeParams, UnsignedTransaction};
pub use nonce::NonceSession;
pub use signer::{Credential, DelegatedSigner, SignedTransaction, PRIVATE_KEY_ENV_VAR};
