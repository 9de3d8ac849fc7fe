//! Contract invocation flows: encoding, simulation gating, queries, and
//! event decoding against receipts.

mod common;

use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, B256, U256};

use chain_gateway::contract::ContractBinding;
use chain_gateway::ledger::{ChainError, LogEntry};
use chain_gateway::orchestrator::{BatchItem, Orchestrator, TransferRequest};
use chain_gateway::tx::Credential;

use common::{test_config, MockLedger, RECIPIENT_A, TEST_ADDRESS, TEST_PRIVATE_KEY};

const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

const RECORDS_ABI: &str = r#"[
    {
        "type": "function",
        "name": "setRecord",
        "inputs": [
            {"name": "recordId", "type": "uint256"},
            {"name": "data", "type": "string"}
        ],
        "outputs": [],
        "stateMutability": "nonpayable"
    },
    {
        "type": "function",
        "name": "getVersion",
        "inputs": [],
        "outputs": [{"name": "", "type": "uint256"}],
        "stateMutability": "view"
    },
    {
        "type": "event",
        "name": "RecordUpdated",
        "inputs": [
            {"name": "recordId", "type": "uint256", "indexed": true},
            {"name": "author", "type": "address", "indexed": true},
            {"name": "version", "type": "uint64", "indexed": false}
        ],
        "anonymous": false
    }
]"#;

fn binding() -> ContractBinding {
    ContractBinding::from_json(RECORDS_ABI, CONTRACT.parse().unwrap()).unwrap()
}

fn orchestrator(ledger: &Arc<MockLedger>) -> Orchestrator {
    Orchestrator::new(ledger.clone(), &test_config())
}

fn credential() -> Credential {
    Credential::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

fn set_record_args() -> Vec<DynSolValue> {
    vec![
        DynSolValue::Uint(U256::from(7u64), 256),
        DynSolValue::String("updated payload".into()),
    ]
}

#[tokio::test]
async fn contract_call_broadcasts_the_encoded_payload() {
    let ledger = Arc::new(MockLedger::new(3));
    let b = binding();

    let receipt = orchestrator(&ledger)
        .call_contract_method(
            &b,
            "setRecord",
            &set_record_args(),
            TEST_ADDRESS,
            None,
            &credential(),
        )
        .await
        .unwrap();

    assert!(receipt.success);
    let expected = b.encode_call("setRecord", &set_record_args()).unwrap();
    let sent = ledger.sent.lock().unwrap();
    assert_eq!(sent[0].input, expected);
    assert_eq!(sent[0].to, Some(b.address()));
    assert_eq!(sent[0].nonce, 3);
    // No explicit limit: the simulation's estimate is used.
    assert_eq!(sent[0].gas_limit, 50_000);
    assert_eq!(ledger.count("estimate_gas"), 1);
}

#[tokio::test]
async fn explicit_gas_limit_overrides_estimate_but_not_the_check() {
    let ledger = Arc::new(MockLedger::new(0));

    orchestrator(&ledger)
        .call_contract_method(
            &binding(),
            "setRecord",
            &set_record_args(),
            TEST_ADDRESS,
            Some(80_000),
            &credential(),
        )
        .await
        .unwrap();

    let sent = ledger.sent.lock().unwrap();
    assert_eq!(sent[0].gas_limit, 80_000);
    // The revert check ran even though the estimate was discarded.
    assert_eq!(ledger.count("estimate_gas"), 1);
}

#[tokio::test]
async fn doomed_call_is_surfaced_before_signing() {
    let ledger = Arc::new(MockLedger::new(0).with_estimate_revert("record is sealed"));

    let result = orchestrator(&ledger)
        .call_contract_method(
            &binding(),
            "setRecord",
            &set_record_args(),
            TEST_ADDRESS,
            None,
            &credential(),
        )
        .await;

    match result {
        Err(ChainError::SimulationReverted(reason)) => assert_eq!(reason, "record is sealed"),
        other => panic!("expected SimulationReverted, got {other:?}"),
    }
    // Failed before the nonce session opened; nothing signed or sent.
    assert_eq!(ledger.count("transaction_count"), 0);
    assert_eq!(ledger.count("send_raw_transaction"), 0);
}

#[tokio::test]
async fn unknown_method_makes_no_network_call() {
    let ledger = Arc::new(MockLedger::new(0));

    let result = orchestrator(&ledger)
        .call_contract_method(
            &binding(),
            "deleteRecord",
            &[],
            TEST_ADDRESS,
            None,
            &credential(),
        )
        .await;

    assert!(matches!(result, Err(ChainError::UnknownMethod(_))));
    assert!(ledger.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mistyped_arguments_make_no_network_call() {
    let ledger = Arc::new(MockLedger::new(0));

    let result = orchestrator(&ledger)
        .call_contract_method(
            &binding(),
            "setRecord",
            &[DynSolValue::Bool(true), DynSolValue::Bool(false)],
            TEST_ADDRESS,
            None,
            &credential(),
        )
        .await;

    assert!(matches!(
        result,
        Err(ChainError::ArgumentTypeMismatch { .. })
    ));
    assert!(ledger.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn query_needs_no_nonce_and_no_signature() {
    let response = DynSolValue::Uint(U256::from(9u64), 256).abi_encode();
    let ledger = Arc::new(MockLedger::new(0).with_call_response(response));

    let values = orchestrator(&ledger)
        .query_contract_method(&binding(), "getVersion", &[])
        .await
        .unwrap();

    assert_eq!(values, vec![DynSolValue::Uint(U256::from(9u64), 256)]);
    assert_eq!(ledger.count("call"), 1);
    assert_eq!(ledger.count("transaction_count"), 0);
    assert_eq!(ledger.count("send_raw_transaction"), 0);
}

#[tokio::test]
async fn emitted_event_decodes_from_the_receipt() {
    let b = binding();
    let author: Address = TEST_ADDRESS.parse().unwrap();
    let event = &b.abi().event("RecordUpdated").unwrap()[0];
    let log = LogEntry {
        address: b.address(),
        topics: vec![
            event.selector(),
            B256::from(U256::from(7u64).to_be_bytes::<32>()),
            author.into_word(),
        ],
        data: Bytes::from(DynSolValue::Uint(U256::from(2u64), 64).abi_encode()),
    };
    let ledger = Arc::new(MockLedger::new(0).with_receipt_logs(vec![log]));

    let receipt = orchestrator(&ledger)
        .call_contract_method(
            &b,
            "setRecord",
            &set_record_args(),
            TEST_ADDRESS,
            None,
            &credential(),
        )
        .await
        .unwrap();

    let decoded = b
        .decode_event(&receipt, "RecordUpdated")
        .unwrap()
        .expect("event should be present");
    assert_eq!(
        decoded.field("recordId"),
        Some(&DynSolValue::Uint(U256::from(7u64), 256))
    );
    assert_eq!(decoded.field("author"), Some(&DynSolValue::Address(author)));
}

#[tokio::test]
async fn absent_event_is_data_not_a_fault() {
    let b = binding();
    let ledger = Arc::new(MockLedger::new(0));

    let receipt = orchestrator(&ledger)
        .call_contract_method(
            &b,
            "setRecord",
            &set_record_args(),
            TEST_ADDRESS,
            None,
            &credential(),
        )
        .await
        .unwrap();

    let decoded = b.decode_event(&receipt, "RecordUpdated").unwrap();
    assert!(decoded.is_none());
}

#[tokio::test]
async fn mixed_batch_runs_calls_and_transfers_in_order() {
    let ledger = Arc::new(MockLedger::new(20));
    let b = binding();

    let items = vec![
        BatchItem::Transfer(TransferRequest {
            to: RECIPIENT_A.to_string(),
            amount: "1".to_string(),
        }),
        BatchItem::ContractCall {
            binding: b.clone(),
            method: "setRecord".to_string(),
            args: set_record_args(),
        },
    ];

    let result = orchestrator(&ledger)
        .run_batch(TEST_ADDRESS, items, 100_000, &credential())
        .await
        .unwrap();

    assert!(result.all_confirmed());
    assert_eq!(ledger.sent_nonces(), vec![20, 21]);

    let expected = b.encode_call("setRecord", &set_record_args()).unwrap();
    let sent = ledger.sent.lock().unwrap();
    assert!(sent[0].input.is_empty());
    assert_eq!(sent[1].input, expected);
    assert_eq!(sent[1].to, Some(b.address()));
    // The call item was simulated before its nonce was consumed.
    assert_eq!(ledger.count("estimate_gas"), 1);
}
