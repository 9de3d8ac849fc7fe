//! Broadcast and confirmation monitoring.
//!
//! Submits a signed wire form, then polls the receipt and block height
//! until the configured confirmation depth is reached. There is no overall
//! deadline here: an already-submitted transaction cannot be cancelled, so
//! callers that need one wrap their own and treat expiry as the network
//! being unavailable. Broadcast failures are never retried automatically:
//! a blind retry of a transfer risks a double-send while the first copy
//! may still confirm.

use std::time::Duration;
use tokio::time::interval;

use crate::ledger::types::{ChainError, ChainResult, LedgerRpc, Receipt};
use crate::tx::signer::SignedTransaction;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Submit a signed transaction and wait for `confirmations` blocks of
/// depth on top of it.
///
/// With `confirmations == 0` the first receipt sighting resolves the call.
/// A mined-but-failed receipt is [`ChainError::ExecutionReverted`]: the
/// nonce is consumed and the outcome is terminal.
pub async fn submit(
    network: &dyn LedgerRpc,
    signed: &SignedTransaction,
    confirmations: u32,
) -> ChainResult<Receipt> {
    let tx_hash = network.send_raw_transaction(signed.raw()).await?;

    tracing::info!(
        tx_hash = %tx_hash,
        nonce = signed.nonce(),
        from = %signed.from_addr(),
        "Transaction submitted"
    );

    let mut ticker = interval(POLL_INTERVAL);
    loop {
        ticker.tick().await;

        let receipt = match network.transaction_receipt(tx_hash).await? {
            Some(r) => r,
            None => {
                tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                continue;
            }
        };

        if !receipt.success {
            return Err(ChainError::ExecutionReverted(format!(
                "transaction {tx_hash} reverted in block {}",
                receipt.block_number
            )));
        }

        if confirmations == 0 {
            return Ok(receipt);
        }

        let current_block = network.block_number().await?;
        let depth = current_block.saturating_sub(receipt.block_number) as u32;
        if depth >= confirmations {
            tracing::info!(
                tx_hash = %tx_hash,
                block_number = receipt.block_number,
                "Transaction confirmed"
            );
            return Ok(receipt);
        }

        tracing::debug!(
            tx_hash = %tx_hash,
            depth,
            required = confirmations,
            "Waiting for confirmations"
        );
    }
}
