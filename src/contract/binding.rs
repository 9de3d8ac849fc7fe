//! Contract bindings: ABI-driven call encoding and event decoding.
//!
//! A binding pairs an externally supplied interface description with a
//! deployed address. Calls are validated against the description before
//! anything touches the network, so a typo'd method name or a wrong-typed
//! argument never consumes a nonce or gas.

use alloy::dyn_abi::{DynSolValue, EventExt, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;

use crate::ledger::types::{ChainError, ChainResult, LedgerRpc, Receipt};

/// An interface description bound to a deployed contract address.
///
/// Immutable; construct once and reuse for repeated calls.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    abi: JsonAbi,
    address: Address,
}

/// One decoded event occurrence, fields in declaration order.
#[derive(Debug, Clone)]
pub struct DecodedEventData {
    pub name: String,
    pub fields: Vec<(String, DynSolValue)>,
}

impl DecodedEventData {
    /// Look up a decoded field by parameter name.
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl ContractBinding {
    pub fn new(abi: JsonAbi, address: Address) -> Self {
        Self { abi, address }
    }

    /// Parse an ABI JSON document and bind it to `address`.
    pub fn from_json(abi_json: &str, address: Address) -> Result<Self, serde_json::Error> {
        let abi: JsonAbi = serde_json::from_str(abi_json)?;
        Ok(Self::new(abi, address))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The interface description this binding validates against.
    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Resolve `method` + `args` to a declared function, validating arity
    /// and argument types. Local only; no network access.
    fn resolve_function(&self, method: &str, args: &[DynSolValue]) -> ChainResult<&Function> {
        let overloads = self
            .abi
            .function(method)
            .ok_or_else(|| ChainError::UnknownMethod(method.to_string()))?;

        let function = overloads
            .iter()
            .find(|f| f.inputs.len() == args.len())
            .ok_or_else(|| ChainError::ArgumentTypeMismatch {
                method: method.to_string(),
                detail: format!(
                    "expected {} argument(s), got {}",
                    overloads[0].inputs.len(),
                    args.len()
                ),
            })?;

        for (i, (param, value)) in function.inputs.iter().zip(args).enumerate() {
            let ty = param
                .resolve()
                .map_err(|e| ChainError::ArgumentTypeMismatch {
                    method: method.to_string(),
                    detail: format!("parameter {i} ({}): {e}", param.ty),
                })?;
            if !ty.matches(value) {
                return Err(ChainError::ArgumentTypeMismatch {
                    method: method.to_string(),
                    detail: format!("parameter {i} expects {}, got an incompatible value", param.ty),
                });
            }
        }

        Ok(function)
    }

    /// ABI-encode a call to `method`, selector included.
    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> ChainResult<Bytes> {
        let function = self.resolve_function(method, args)?;
        let encoded = function
            .abi_encode_input(args)
            .map_err(|e| ChainError::ArgumentTypeMismatch {
                method: method.to_string(),
                detail: e.to_string(),
            })?;
        Ok(Bytes::from(encoded))
    }

    /// Simulated-execution gas cost of calling `method` from `from`.
    ///
    /// Surfaces [`ChainError::SimulationReverted`] when the node predicts
    /// the call would abort. Checked before signing, since a doomed call
    /// still costs the sender gas once broadcast.
    pub async fn estimate_call_gas(
        &self,
        network: &dyn LedgerRpc,
        method: &str,
        args: &[DynSolValue],
        from: Address,
    ) -> ChainResult<u64> {
        let payload = self.encode_call(method, args)?;
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(self.address)
            .with_input(payload);
        network.estimate_gas(&request).await
    }

    /// Read-only invocation: no nonce, no signature, decoded return values.
    pub async fn query(
        &self,
        network: &dyn LedgerRpc,
        method: &str,
        args: &[DynSolValue],
    ) -> ChainResult<Vec<DynSolValue>> {
        let function = self.resolve_function(method, args)?;
        let payload = function
            .abi_encode_input(args)
            .map_err(|e| ChainError::ArgumentTypeMismatch {
                method: method.to_string(),
                detail: e.to_string(),
            })?;

        let request = TransactionRequest::default()
            .with_to(self.address)
            .with_input(Bytes::from(payload));
        let data = network.call(&request).await?;

        function
            .abi_decode_output(&data)
            .map_err(|e| ChainError::ArgumentTypeMismatch {
                method: method.to_string(),
                detail: format!("return data does not match declared outputs: {e}"),
            })
    }

    /// Decode the first occurrence of `event_name` in a receipt.
    ///
    /// Returns `Ok(None)` when the event was not emitted: absence is
    /// data, not a fault. An event name missing from the interface
    /// description is [`ChainError::UnknownMethod`].
    pub fn decode_event(
        &self,
        receipt: &Receipt,
        event_name: &str,
    ) -> ChainResult<Option<DecodedEventData>> {
        let overloads = self
            .abi
            .event(event_name)
            .ok_or_else(|| ChainError::UnknownMethod(event_name.to_string()))?;

        for log in &receipt.logs {
            if log.address != self.address {
                continue;
            }
            let Some(topic0) = log.topics.first() else {
                continue;
            };

            for event in overloads {
                if event.selector() != *topic0 {
                    continue;
                }

                let decoded = event
                    .decode_log_parts(log.topics.iter().copied(), &log.data)
                    .map_err(|e| ChainError::ArgumentTypeMismatch {
                        method: event_name.to_string(),
                        detail: format!("event data does not match declaration: {e}"),
                    })?;

                // Reassemble fields in declaration order: indexed values
                // come from topics, the rest from the data section.
                let mut indexed = decoded.indexed.into_iter();
                let mut body = decoded.body.into_iter();
                let mut fields = Vec::with_capacity(event.inputs.len());
                for param in &event.inputs {
                    let value = if param.indexed {
                        indexed.next()
                    } else {
                        body.next()
                    };
                    match value {
                        Some(v) => fields.push((param.name.clone(), v)),
                        None => {
                            return Err(ChainError::ArgumentTypeMismatch {
                                method: event_name.to_string(),
                                detail: "event data does not match declaration".to_string(),
                            })
                        }
                    }
                }

                return Ok(Some(DecodedEventData {
                    name: event.name.clone(),
                    fields,
                }));
            }
        }

        Ok(None)
    }
}
