mod common;

use std::time::Duration;

use alloy::primitives::{keccak256, B256};
use serde_json::json;

use common::{init_tracing, task_contract};
use dapp_wallet_adapters::Eip1193Adapter;
use dapp_wallet_core::{
    ContractClient, InvocationConfig, NoopObserver, RpcError, TransactionReceipt, WalletError,
    WriteObserver, WriteOutcome,
};

fn fast_config() -> InvocationConfig {
    InvocationConfig {
        receipt_poll_interval: Duration::from_millis(1),
        confirmation_timeout: Duration::from_secs(2),
    }
}

fn selector_prefix(signature: &str) -> String {
    format!("0x{}", alloy::hex::encode(&keccak256(signature)[..4]))
}

#[derive(Default)]
struct Stages(Vec<&'static str>);

impl WriteObserver for Stages {
    fn on_switching(&mut self, _message: &str) {
        self.0.push("switching");
    }
    fn on_switched(&mut self, _message: &str) {
        self.0.push("switched");
    }
    fn on_submitted(&mut self, _tx_hash: B256) {
        self.0.push("submitted");
    }
    fn on_confirmed(&mut self, _receipt: &TransactionReceipt) {
        self.0.push("confirmed");
    }
}

#[test]
fn read_against_the_deterministic_wallet() {
    init_tracing();
    let adapter = Eip1193Adapter::deterministic();
    adapter.set_active_chain(8453);
    adapter.set_call_result(
        &selector_prefix("taskCount()"),
        &format!("0x{:064x}", 12u64),
    );

    let client = ContractClient::new(&adapter, task_contract());
    let values = client.read("taskCount", &[]).expect("read succeeds");

    let (count, _) = values[0].as_uint().expect("uint output");
    assert_eq!(count.to::<u64>(), 12);
}

#[test]
fn read_refuses_to_run_off_the_contract_chain() {
    init_tracing();
    let adapter = Eip1193Adapter::deterministic();
    // Active chain stays at mainnet.

    let client = ContractClient::new(&adapter, task_contract());
    let err = client.read("taskCount", &[]).expect_err("must fail");

    assert!(matches!(err, WalletError::WrongNetwork { .. }));
    assert_eq!(adapter.call_count("eth_call"), 0);
}

#[test]
fn write_switches_submits_and_waits_for_the_delayed_receipt() {
    init_tracing();
    let adapter = Eip1193Adapter::deterministic();
    adapter.set_receipt_delay(2);

    let client = ContractClient::new(&adapter, task_contract()).with_config(fast_config());
    let mut stages = Stages::default();
    let outcome = client
        .write("createTask", &[json!("ship the release")], &mut stages)
        .expect("write succeeds");

    // Started on mainnet: one full switch negotiation ran first.
    assert_eq!(stages.0, vec!["switching", "switched", "submitted", "confirmed"]);
    assert_eq!(adapter.active_chain(), 8453);
    match outcome {
        WriteOutcome::Receipt(receipt) => {
            assert_eq!(receipt.status, Some(true));
            assert!(receipt.block_number.is_some());
        }
        WriteOutcome::Value(_) => panic!("expected a receipt"),
    }
    // Two null polls before the receipt appeared.
    assert_eq!(adapter.call_count("eth_getTransactionReceipt"), 3);
}

#[test]
fn view_routed_through_the_write_path_skips_submission() {
    init_tracing();
    let adapter = Eip1193Adapter::deterministic();
    adapter.set_active_chain(8453);
    adapter.set_call_result(&selector_prefix("taskCount()"), &format!("0x{:064x}", 4u64));

    let client = ContractClient::new(&adapter, task_contract());
    let outcome = client
        .write("taskCount", &[], &mut NoopObserver)
        .expect("view write succeeds");

    assert!(matches!(outcome, WriteOutcome::Value(_)));
    assert_eq!(adapter.call_count("eth_sendTransaction"), 0);
}

#[test]
fn scripted_revert_maps_to_the_not_deployed_error() {
    init_tracing();
    let adapter = Eip1193Adapter::deterministic();
    adapter.set_active_chain(8453);
    adapter.script_error(
        "eth_call",
        RpcError::labeled("CALL_EXCEPTION", "missing revert data in call exception"),
    );

    let client = ContractClient::new(&adapter, task_contract());
    let err = client.read("taskCount", &[]).expect_err("must fail");

    assert!(matches!(err, WalletError::ContractRevertedOrNotDeployed));
}

#[test]
fn scripted_rate_limit_maps_to_rate_limited() {
    init_tracing();
    let adapter = Eip1193Adapter::deterministic();
    adapter.set_active_chain(8453);
    adapter.script_error("eth_sendTransaction", RpcError::numeric(-32002, "already pending"));

    let client = ContractClient::new(&adapter, task_contract()).with_config(fast_config());
    let err = client
        .write("createTask", &[json!("rate limited")], &mut NoopObserver)
        .expect_err("must fail");

    assert!(matches!(err, WalletError::RateLimited));
}

#[test]
fn write_without_an_authorized_account_fails() {
    init_tracing();
    let adapter = Eip1193Adapter::deterministic();
    adapter.set_active_chain(8453);
    adapter.set_accounts(Vec::new());

    let client = ContractClient::new(&adapter, task_contract()).with_config(fast_config());
    let err = client
        .write("createTask", &[json!("no signer")], &mut NoopObserver)
        .expect_err("must fail");

    assert!(matches!(err, WalletError::WriteFailed(_)));
    assert_eq!(adapter.call_count("eth_sendTransaction"), 0);
}
