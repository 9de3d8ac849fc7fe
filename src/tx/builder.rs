//! Unsigned transaction assembly.
//!
//! Builders are synchronous and validate their inputs before touching the
//! nonce session: a request that cannot succeed must not strand a sequence
//! number. Each successful build consumes exactly one nonce.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;

use crate::ledger::types::{parse_address, ChainResult};
use crate::tx::nonce::NonceSession;

/// Fee fields shared by every transaction in one orchestration run.
///
/// The gas price is queried once per run by the orchestrator; the gas
/// limit is caller-supplied (gas-price market strategy is out of scope).
#[derive(Debug, Clone, Copy)]
pub struct FeeParams {
    pub gas_limit: u64,
    pub gas_price: u128,
    pub chain_id: u64,
}

/// A fully-specified transaction awaiting a signature.
///
/// Immutable once constructed: the nonce is assigned exactly once, by the
/// builder, and no field can be changed afterwards.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    from: Address,
    to: Option<Address>,
    value: U256,
    gas_limit: u64,
    gas_price: u128,
    nonce: u64,
    chain_id: u64,
    input: Bytes,
}

impl UnsignedTransaction {
    pub fn from_addr(&self) -> Address {
        self.from
    }

    /// Recipient; `None` would mean contract creation, which this layer
    /// never produces.
    pub fn to(&self) -> Option<Address> {
        self.to
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn gas_price(&self) -> u128 {
        self.gas_price
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// ABI-encoded call data; empty for plain transfers.
    pub fn input(&self) -> &Bytes {
        &self.input
    }

    /// Render as the RPC request shape consumed by signing and gas
    /// estimation.
    pub fn to_request(&self) -> TransactionRequest {
        let mut request = TransactionRequest::default()
            .with_from(self.from)
            .with_value(self.value)
            .with_nonce(self.nonce)
            .with_gas_limit(self.gas_limit)
            .with_gas_price(self.gas_price)
            .with_chain_id(self.chain_id)
            .with_input(self.input.clone());
        if let Some(to) = self.to {
            request = request.with_to(to);
        }
        request
    }
}

/// Build a plain value transfer.
///
/// The recipient is parsed before the nonce is consumed; a malformed
/// address fails with `InvalidAddress` and leaves the session untouched.
pub fn build_transfer(
    session: &mut NonceSession,
    to: &str,
    value: U256,
    fees: FeeParams,
) -> ChainResult<UnsignedTransaction> {
    let to = parse_address(to)?;
    Ok(UnsignedTransaction {
        from: session.address(),
        to: Some(to),
        value,
        gas_limit: fees.gas_limit,
        gas_price: fees.gas_price,
        nonce: session.next(),
        chain_id: fees.chain_id,
        input: Bytes::new(),
    })
}

/// Build a contract invocation carrying an ABI-encoded payload.
pub fn build_contract_call(
    session: &mut NonceSession,
    contract: Address,
    payload: Bytes,
    fees: FeeParams,
) -> ChainResult<UnsignedTransaction> {
    Ok(UnsignedTransaction {
        from: session.address(),
        to: Some(contract),
        value: U256::ZERO,
        gas_limit: fees.gas_limit,
        gas_price: fees.gas_price,
        nonce: session.next(),
        chain_id: fees.chain_id,
        input: payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::ChainError;
    use crate::ledger::units::Units;

    const SENDER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const RECIPIENT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn fees() -> FeeParams {
        FeeParams {
            gas_limit: 21_000,
            gas_price: 1_000_000_000,
            chain_id: 31337,
        }
    }

    #[test]
    fn test_transfer_uses_fresh_base_nonce() {
        // 1.5 units at exponent 18, gas limit 21000: the canonical
        // transfer scenario.
        let mut session = NonceSession::with_base(SENDER.parse().unwrap(), 42);
        let value = Units::ETHER.to_atomic("1.5").unwrap();

        let tx = build_transfer(&mut session, RECIPIENT, value, fees()).unwrap();

        assert_eq!(tx.nonce(), 42);
        assert_eq!(tx.value().to_string(), "1500000000000000000");
        assert_eq!(tx.gas_limit(), 21_000);
        assert_eq!(tx.to(), Some(RECIPIENT.parse().unwrap()));
        assert!(tx.input().is_empty());
        assert_eq!(session.allocated(), 1);
    }

    #[test]
    fn test_each_build_consumes_one_nonce() {
        let mut session = NonceSession::with_base(SENDER.parse().unwrap(), 0);
        let value = U256::from(1u64);

        let a = build_transfer(&mut session, RECIPIENT, value, fees()).unwrap();
        let b = build_transfer(&mut session, RECIPIENT, value, fees()).unwrap();

        assert_eq!(a.nonce(), 0);
        assert_eq!(b.nonce(), 1);
        assert_eq!(session.allocated(), 2);
    }

    #[test]
    fn test_malformed_recipient_does_not_strand_a_nonce() {
        let mut session = NonceSession::with_base(SENDER.parse().unwrap(), 0);

        let result = build_transfer(&mut session, "0xnot-an-address", U256::ZERO, fees());

        assert!(matches!(result, Err(ChainError::InvalidAddress(_))));
        assert_eq!(session.allocated(), 0);
    }

    #[test]
    fn test_contract_call_carries_payload() {
        let mut session = NonceSession::with_base(SENDER.parse().unwrap(), 3);
        let contract: Address = RECIPIENT.parse().unwrap();
        let payload = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]);

        let tx = build_contract_call(&mut session, contract, payload.clone(), fees()).unwrap();

        assert_eq!(tx.nonce(), 3);
        assert_eq!(tx.to(), Some(contract));
        assert_eq!(tx.value(), U256::ZERO);
        assert_eq!(tx.input(), &payload);
    }
}
