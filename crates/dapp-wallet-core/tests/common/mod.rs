#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alloy::primitives::Address;
use serde_json::{json, Value};

use dapp_wallet_core::{
    ChainDescriptor, ChainRegistry, ContractDescriptor, NativeCurrency, ProviderEvent,
    ProviderPort, RpcError,
};

/// Scriptable provider double: per-method one-shot responses consumed in
/// order, persistent fallbacks for repeated calls, every request recorded.
#[derive(Default)]
pub struct MockProvider {
    scripted: Mutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
    defaults: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<(String, Value)>>,
    events: Mutex<Vec<ProviderEvent>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a one-shot response for the next call of `method`.
    pub fn enqueue(&self, method: &str, response: Result<Value, RpcError>) {
        self.scripted
            .lock()
            .unwrap()
            .entry(method.to_owned())
            .or_default()
            .push_back(response);
    }

    pub fn enqueue_ok(&self, method: &str, value: Value) {
        self.enqueue(method, Ok(value));
    }

    pub fn enqueue_err(&self, method: &str, error: RpcError) {
        self.enqueue(method, Err(error));
    }

    /// Persistent response used whenever no one-shot is queued.
    pub fn respond(&self, method: &str, value: Value) {
        self.defaults
            .lock()
            .unwrap()
            .insert(method.to_owned(), value);
    }

    pub fn push_event(&self, event: ProviderEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|(m, _)| m).collect()
    }

    pub fn calls_for(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params)
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls_for(method).len()
    }
}

impl ProviderPort for MockProvider {
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_owned(), params));
        if let Some(queue) = self.scripted.lock().unwrap().get_mut(method) {
            if let Some(response) = queue.pop_front() {
                return response;
            }
        }
        if let Some(value) = self.defaults.lock().unwrap().get(method) {
            return Ok(value.clone());
        }
        Err(RpcError::message_only(format!(
            "no scripted response for {method}"
        )))
    }

    fn drain_events(&self) -> Vec<ProviderEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }
}

pub fn eth() -> NativeCurrency {
    NativeCurrency {
        name: "Ether".to_owned(),
        symbol: "ETH".to_owned(),
        decimals: 18,
    }
}

pub fn chain(id: u64, name: &str) -> ChainDescriptor {
    ChainDescriptor {
        id,
        name: name.to_owned(),
        rpc_urls: vec![format!("https://rpc.{}.example", name.to_lowercase())],
        native_currency: eth(),
        block_explorer_url: Some(format!("https://scan.{}.example", name.to_lowercase())),
    }
}

/// Base mainnet as default, Ethereum mainnet as the other supported chain.
pub fn registry() -> ChainRegistry {
    ChainRegistry::new(vec![chain(8453, "Base"), chain(1, "Ethereum")])
        .expect("non-empty chain set")
}

pub fn task_abi_json() -> &'static str {
    r#"[
        {"type":"function","name":"createTask","inputs":[{"name":"description","type":"string"}],"outputs":[],"stateMutability":"nonpayable"},
        {"type":"function","name":"taskCount","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
        {"type":"event","name":"TaskCreated","inputs":[{"name":"id","type":"uint256","indexed":true},{"name":"description","type":"string","indexed":false}],"anonymous":false}
    ]"#
}

pub fn task_contract() -> ContractDescriptor {
    ContractDescriptor::from_abi_json(
        contract_address(),
        task_abi_json(),
        chain(8453, "Base"),
        registry(),
        None,
    )
    .expect("valid contract descriptor")
}

pub fn contract_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid contract address")
}

pub fn user_address() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid user address")
}

pub fn accounts_json(addresses: &[Address]) -> Value {
    json!(addresses.iter().map(|a| a.to_string()).collect::<Vec<_>>())
}

/// A 32-byte ABI word holding `value`, as an `eth_call` result string.
pub fn uint_word(value: u64) -> Value {
    json!(format!("0x{value:064x}"))
}
