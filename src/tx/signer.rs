//! Credentials and transaction signing.
//!
//! # Security
//! - Private keys are loaded only from environment variables
//! - Keys are never logged or serialized; `Credential`'s `Debug` prints
//!   the controlled address, nothing else
//! - A credential is borrowed for the duration of a single `sign` call
//!   and never cached by the pipeline

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;

use crate::ledger::types::{ChainError, ChainResult};
use crate::tx::builder::UnsignedTransaction;

/// Environment variable holding the local signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "GATEWAY_PRIVATE_KEY";

/// An external signing authority (browser wallet, hardware device, ...).
///
/// The implementation presents the unsigned transaction for approval and
/// suspends until the authority returns the signed wire form or declines;
/// a decline surfaces as [`ChainError::SigningRejected`].
#[async_trait::async_trait]
pub trait DelegatedSigner: Send + Sync {
    /// The address this authority signs for.
    fn address(&self) -> Address;

    /// Sign the transaction and return the broadcast-ready wire form.
    async fn sign_transaction(&self, tx: &UnsignedTransaction) -> ChainResult<Bytes>;
}

/// A signing capability: raw key material held locally, or a delegated
/// external authority. Both bind the signature to every mutable field of
/// the transaction (sender, recipient, amount, nonce, payload, gas).
#[derive(Clone)]
pub enum Credential {
    /// Local key material; signs synchronously in-process.
    LocalKey(PrivateKeySigner),
    /// Delegated provider; signing suspends on out-of-band approval.
    Delegated(Arc<dyn DelegatedSigner>),
}

impl Credential {
    /// Build a local-key credential from a hex-encoded private key, with
    /// or without a `0x` prefix.
    pub fn from_private_key(private_key_hex: &str) -> ChainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::InvalidCredential(format!("invalid private key: {e}")))?;

        tracing::info!(address = %signer.address(), "Local signing credential loaded");

        Ok(Self::LocalKey(signer))
    }

    /// Load a local-key credential from [`PRIVATE_KEY_ENV_VAR`].
    pub fn from_env() -> ChainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            ChainError::InvalidCredential(format!(
                "environment variable {PRIVATE_KEY_ENV_VAR} not set"
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    /// The address this credential controls.
    pub fn address(&self) -> Address {
        match self {
            Self::LocalKey(signer) => signer.address(),
            Self::Delegated(provider) => provider.address(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::LocalKey(_) => "LocalKey",
            Self::Delegated(_) => "Delegated",
        };
        f.debug_struct("Credential")
            .field("variant", &variant)
            .field("address", &self.address())
            .finish()
    }
}

/// A signed, broadcast-ready transaction.
///
/// Opaque to everything except the broadcaster; only bookkeeping fields
/// are exposed.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    from: Address,
    nonce: u64,
    tx_hash: TxHash,
    raw: Bytes,
}

impl SignedTransaction {
    pub fn from_addr(&self) -> Address {
        self.from
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Hash the network will know this transaction by.
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Serialized wire form.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    #[cfg(test)]
    pub(crate) fn fabricate(from: Address, nonce: u64, raw: Bytes) -> Self {
        Self {
            from,
            nonce,
            tx_hash: keccak256(&raw),
            raw,
        }
    }
}

/// Bind a transaction to a credential.
///
/// Fails with [`ChainError::InvalidCredential`] when the credential does
/// not control the declared sender, and [`ChainError::SigningRejected`]
/// when a delegated authority declines. Nothing reaches the network.
pub async fn sign(
    unsigned: &UnsignedTransaction,
    credential: &Credential,
) -> ChainResult<SignedTransaction> {
    let declared = unsigned.from_addr();
    let controlled = credential.address();
    if controlled != declared {
        return Err(ChainError::InvalidCredential(format!(
            "credential controls {controlled}, transaction declares sender {declared}"
        )));
    }

    let raw = match credential {
        Credential::LocalKey(signer) => {
            let wallet = EthereumWallet::from(signer.clone());
            let envelope: TxEnvelope = unsigned
                .to_request()
                .build(&wallet)
                .await
                .map_err(|e| ChainError::InvalidCredential(format!("signing failed: {e}")))?;
            Bytes::from(envelope.encoded_2718())
        }
        Credential::Delegated(provider) => provider.sign_transaction(unsigned).await?,
    };

    Ok(SignedTransaction {
        from: declared,
        nonce: unsigned.nonce(),
        tx_hash: keccak256(&raw),
        raw,
    })
}
