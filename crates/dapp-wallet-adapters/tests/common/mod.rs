#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::thread;

use alloy::primitives::Address;
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use dapp_wallet_core::{ChainDescriptor, ChainRegistry, ContractDescriptor, NativeCurrency};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
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
        block_explorer_url: None,
    }
}

pub fn registry() -> ChainRegistry {
    ChainRegistry::new(vec![chain(1, "Ethereum"), chain(8453, "Base")])
        .expect("non-empty chain set")
}

pub fn task_abi_json() -> &'static str {
    r#"[
        {"type":"function","name":"createTask","inputs":[{"name":"description","type":"string"}],"outputs":[],"stateMutability":"nonpayable"},
        {"type":"function","name":"taskCount","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
        {"type":"event","name":"TaskCreated","inputs":[{"name":"id","type":"uint256","indexed":true},{"name":"description","type":"string","indexed":false}],"anonymous":false}
    ]"#
}

pub fn contract_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid contract address")
}

/// Contract pinned to Base with Ethereum as the other supported chain.
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

/// One scripted JSON-RPC response: matched by method, answered with
/// either a `result` or an `error` object.
pub enum RpcScript {
    Result(Value),
    Error { code: i64, message: &'static str },
}

/// Fake JSON-RPC endpoint serving up to 16 requests, recording each
/// method name. Responses come from the per-method script table.
pub fn spawn_json_rpc_server(
    scripts: Vec<(&'static str, RpcScript)>,
    seen_methods: Arc<Mutex<Vec<String>>>,
) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());

    let join = thread::spawn(move || {
        for _ in 0..16 {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let mut body = String::new();
            let _ = std::io::Read::read_to_string(req.as_reader(), &mut body);
            let envelope: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = envelope["method"].as_str().unwrap_or("").to_owned();
            if let Ok(mut g) = seen_methods.lock() {
                g.push(method.clone());
            }

            let payload = match scripts.iter().find(|(m, _)| *m == method) {
                Some((_, RpcScript::Result(value))) => json!({
                    "jsonrpc": "2.0",
                    "id": envelope["id"],
                    "result": value,
                }),
                Some((_, RpcScript::Error { code, message })) => json!({
                    "jsonrpc": "2.0",
                    "id": envelope["id"],
                    "error": { "code": code, "message": message },
                }),
                None => json!({
                    "jsonrpc": "2.0",
                    "id": envelope["id"],
                    "error": { "code": -32601, "message": "method not found" },
                }),
            };

            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(200));
            let _ = req.respond(response);
        }
    });

    (addr, join)
}
