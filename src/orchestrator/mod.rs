//! Caller-facing transaction orchestration.
//!
//! # Data Flow
//! ```text
//! caller intent (transfer / batch / contract call)
//!     → contract::binding (encode + simulate, contract calls only)
//!     → tx::nonce (one session per orchestration run)
//!     → tx::builder (unsigned transaction, nonce assigned once)
//!     → tx::signer (local key or delegated authority)
//!     → tx::broadcast (submit + confirmation depth)
//!     → Receipt / BatchResult
//! ```
//!
//! One logical thread of control per run: every network-facing step is a
//! suspension point and items are processed strictly serially, because
//! each item's nonce is a function of how many prior items in the same
//! session were allocated.

pub mod batch;

pub use batch::{BatchItem, BatchResult, ItemOutcome, Stage, TransferRequest};

use alloy::dyn_abi::DynSolValue;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::contract::ContractBinding;
use crate::ledger::types::{parse_address, ChainResult, LedgerRpc, Receipt};
use crate::ledger::units::Units;
use crate::tx::broadcast;
use crate::tx::builder::{build_contract_call, build_transfer, FeeParams, UnsignedTransaction};
use crate::tx::nonce::NonceSession;
use crate::tx::signer::{sign, Credential};

/// Entry point for everything that moves value or invokes contracts.
///
/// Holds a shared network handle and per-deployment parameters; one
/// instance serves any number of sequential orchestration runs.
pub struct Orchestrator {
    network: Arc<dyn LedgerRpc>,
    units: Units,
    chain_id: u64,
    confirmations: u32,
}

impl Orchestrator {
    pub fn new(network: Arc<dyn LedgerRpc>, config: &GatewayConfig) -> Self {
        Self {
            network,
            units: Units::new(config.currency.decimals),
            chain_id: config.network.chain_id,
            confirmations: config.network.confirmation_blocks,
        }
    }

    /// The unit converter for this deployment's denomination.
    pub fn units(&self) -> Units {
        self.units
    }

    /// Send value to a single recipient and wait for confirmation.
    ///
    /// `amount` is a human-denomination decimal string; conversion to
    /// atomic units is exact or fails with `InvalidAmount`.
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: &str,
        gas_limit: u64,
        credential: &Credential,
    ) -> ChainResult<Receipt> {
        let from = parse_address(from)?;
        parse_address(to)?;
        let value = self.units.to_atomic(amount)?;

        let mut session = NonceSession::open(&*self.network, from).await?;
        let fees = self.fee_params(gas_limit).await?;

        let unsigned = build_transfer(&mut session, to, value, fees)?;
        let signed = sign(&unsigned, credential).await?;
        broadcast::submit(&*self.network, &signed, self.confirmations).await
    }

    /// Run a batch of transfers in input order under one nonce session.
    ///
    /// See [`Orchestrator::run_batch`] for the failure policy.
    pub async fn batch_transfer(
        &self,
        from: &str,
        transfers: Vec<TransferRequest>,
        gas_limit: u64,
        credential: &Credential,
    ) -> ChainResult<BatchResult> {
        let items = transfers.into_iter().map(BatchItem::Transfer).collect();
        self.run_batch(from, items, gas_limit, credential).await
    }

    /// Drive an ordered sequence of transfers and contract calls using one
    /// nonce session.
    ///
    /// Every item is validated locally before the session opens: an
    /// invalid address or amount anywhere in the batch fails the whole
    /// call with nothing consumed. Items are then processed strictly in
    /// input order. A failure on item *k* aborts items *k+1..n*: their
    /// pre-allocated nonces are discarded unbroadcast and their outcome is
    /// [`ItemOutcome::NotAttempted`]. Later items may depend on earlier
    /// ones, so continuing past a failure could violate ordering
    /// assumptions the caller baked into the batch.
    pub async fn run_batch(
        &self,
        from: &str,
        items: Vec<BatchItem>,
        gas_limit: u64,
        credential: &Credential,
    ) -> ChainResult<BatchResult> {
        let from = parse_address(from)?;
        for item in &items {
            self.validate_item(item)?;
        }

        let mut session = NonceSession::open(&*self.network, from).await?;
        let fees = self.fee_params(gas_limit).await?;

        tracing::info!(
            from = %from,
            items = items.len(),
            base_nonce = session.base_nonce(),
            "Batch started"
        );

        let mut outcomes: Vec<ItemOutcome> = Vec::with_capacity(items.len());
        let mut aborted = false;

        for (index, item) in items.iter().enumerate() {
            if aborted {
                outcomes.push(ItemOutcome::NotAttempted);
                continue;
            }

            let outcome = self.run_item(&mut session, item, fees, credential).await;
            if let ItemOutcome::Failed { stage, error } = &outcome {
                tracing::error!(
                    item = index,
                    stage = ?stage,
                    error = %error,
                    "Batch item failed; aborting remaining items"
                );
                aborted = true;
            }
            outcomes.push(outcome);
        }

        let result = BatchResult::new(outcomes);
        tracing::info!(
            confirmed = result.confirmed_count(),
            items = items.len(),
            "Batch finished"
        );
        Ok(result)
    }

    /// Invoke a state-changing contract method and wait for its receipt.
    ///
    /// Gas estimation always runs first: a call the node predicts will
    /// revert fails with `SimulationReverted` before anything is signed.
    /// An explicit `gas_limit` overrides the estimate for the broadcast
    /// transaction but never skips that check.
    pub async fn call_contract_method(
        &self,
        binding: &ContractBinding,
        method: &str,
        args: &[DynSolValue],
        from: &str,
        gas_limit: Option<u64>,
        credential: &Credential,
    ) -> ChainResult<Receipt> {
        let from = parse_address(from)?;
        let payload = binding.encode_call(method, args)?;

        let estimated = binding
            .estimate_call_gas(&*self.network, method, args, from)
            .await?;
        let gas = gas_limit.unwrap_or(estimated);

        let mut session = NonceSession::open(&*self.network, from).await?;
        let fees = self.fee_params(gas).await?;

        let unsigned = build_contract_call(&mut session, binding.address(), payload, fees)?;
        let signed = sign(&unsigned, credential).await?;
        broadcast::submit(&*self.network, &signed, self.confirmations).await
    }

    /// Read-only contract invocation: no nonce, no signature.
    pub async fn query_contract_method(
        &self,
        binding: &ContractBinding,
        method: &str,
        args: &[DynSolValue],
    ) -> ChainResult<Vec<DynSolValue>> {
        binding.query(&*self.network, method, args).await
    }

    /// Local validation for one batch item; nothing network-facing.
    fn validate_item(&self, item: &BatchItem) -> ChainResult<()> {
        match item {
            BatchItem::Transfer(t) => {
                parse_address(&t.to)?;
                self.units.to_atomic(&t.amount)?;
            }
            BatchItem::ContractCall {
                binding,
                method,
                args,
            } => {
                binding.encode_call(method, args)?;
            }
        }
        Ok(())
    }

    /// Build → sign → submit for one item, reporting the failing stage.
    async fn run_item(
        &self,
        session: &mut NonceSession,
        item: &BatchItem,
        fees: FeeParams,
        credential: &Credential,
    ) -> ItemOutcome {
        let unsigned: UnsignedTransaction = match self.build_item(session, item, fees).await {
            Ok(tx) => tx,
            Err(error) => {
                return ItemOutcome::Failed {
                    stage: Stage::Build,
                    error,
                }
            }
        };

        let signed = match sign(&unsigned, credential).await {
            Ok(tx) => tx,
            Err(error) => {
                return ItemOutcome::Failed {
                    stage: Stage::Sign,
                    error,
                }
            }
        };

        match broadcast::submit(&*self.network, &signed, self.confirmations).await {
            Ok(receipt) => ItemOutcome::Confirmed(receipt),
            Err(error) => ItemOutcome::Failed {
                stage: Stage::Submit,
                error,
            },
        }
    }

    async fn build_item(
        &self,
        session: &mut NonceSession,
        item: &BatchItem,
        fees: FeeParams,
    ) -> ChainResult<UnsignedTransaction> {
        match item {
            BatchItem::Transfer(t) => {
                let value = self.units.to_atomic(&t.amount)?;
                build_transfer(session, &t.to, value, fees)
            }
            BatchItem::ContractCall {
                binding,
                method,
                args,
            } => {
                // Simulate before consuming a nonce; a doomed call must
                // surface as SimulationReverted, not burn gas on-chain.
                binding
                    .estimate_call_gas(&*self.network, method, args, session.address())
                    .await?;
                let payload = binding.encode_call(method, args)?;
                build_contract_call(session, binding.address(), payload, fees)
            }
        }
    }

    async fn fee_params(&self, gas_limit: u64) -> ChainResult<FeeParams> {
        let gas_price = self.network.gas_price().await?;
        Ok(FeeParams {
            gas_limit,
            gas_price,
            chain_id: self.chain_id,
        })
    }
}
