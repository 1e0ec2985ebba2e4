use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, B256};
use serde_json::{json, Value};
use tracing::warn;

use dapp_wallet_core::{hex_chain_id, parse_chain_id, ProviderEvent, ProviderPort, RpcError};

use crate::config::WalletAdapterConfig;
use crate::rpc::post_json_rpc;

/// EIP-1193 provider gateway: a JSON-RPC proxy bridge to a wallet-owning
/// endpoint, a deterministic in-memory wallet simulation, or a disabled
/// mode that fails every request with the EIP-1193 disconnected shape.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
    /// Chains the simulated wallet has configured; switch targets outside
    /// this set produce code 4902 until added.
    wallet_chains: BTreeSet<u64>,
    revocation_supported: bool,
    receipt_delay_polls: u32,
    events: Vec<ProviderEvent>,
    calls: Vec<(String, Value)>,
    scripted_errors: HashMap<String, VecDeque<RpcError>>,
    call_results: Vec<(String, Value)>,
    pending_receipts: HashMap<B256, PendingReceipt>,
    tx_counter: u64,
    filters: HashMap<String, Vec<Value>>,
    next_filter_id: u64,
}

#[derive(Debug)]
struct PendingReceipt {
    polls_remaining: u32,
    receipt: Value,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec![Address::with_last_byte(0x01)],
            chain_id: 1,
            wallet_chains: BTreeSet::from([1]),
            revocation_supported: true,
            receipt_delay_polls: 0,
            events: Vec::new(),
            calls: Vec::new(),
            scripted_errors: HashMap::new(),
            call_results: Vec::new(),
            pending_receipts: HashMap::new(),
            tx_counter: 0,
            filters: HashMap::new(),
            next_filter_id: 1,
        }
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(WalletAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.request_timeout_ms);
            match reqwest::blocking::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client: {e}"
                        ))
                    } else {
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    /// The in-memory wallet simulation, regardless of environment.
    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            mode: ProviderMode::Disabled(reason.into()),
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    /// Whether requests can be served at all.
    pub fn available(&self) -> bool {
        !matches!(self.mode, ProviderMode::Disabled(_))
    }

    // ---- deterministic-wallet controls (test/dev hooks) ----

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.with_state(|g| g.accounts = accounts);
    }

    pub fn set_active_chain(&self, chain_id: u64) {
        self.with_state(|g| {
            g.chain_id = chain_id;
            g.wallet_chains.insert(chain_id);
        });
    }

    /// Replaces the set of chains the simulated wallet knows.
    pub fn set_wallet_chains(&self, chains: impl IntoIterator<Item = u64>) {
        self.with_state(|g| g.wallet_chains = chains.into_iter().collect());
    }

    pub fn set_revocation_supported(&self, supported: bool) {
        self.with_state(|g| g.revocation_supported = supported);
    }

    /// Number of `eth_getTransactionReceipt` polls a new transaction
    /// returns null for before its receipt appears.
    pub fn set_receipt_delay(&self, polls: u32) {
        self.with_state(|g| g.receipt_delay_polls = polls);
    }

    /// Queues a one-shot error for the next request with this method.
    pub fn script_error(&self, method: &str, error: RpcError) {
        self.with_state(|g| {
            g.scripted_errors
                .entry(method.to_owned())
                .or_default()
                .push_back(error)
        });
    }

    /// Fixes the `eth_call` result for calldata starting with the given
    /// hex prefix (usually the 4-byte selector).
    pub fn set_call_result(&self, data_prefix: &str, result: &str) {
        let prefix = data_prefix.to_owned();
        let value = Value::String(result.to_owned());
        self.with_state(|g| g.call_results.push((prefix, value)));
    }

    pub fn inject_accounts_changed(&self, accounts: Vec<Address>) {
        self.with_state(|g| {
            g.accounts = accounts.clone();
            g.events.push(ProviderEvent::AccountsChanged(accounts));
        });
    }

    pub fn inject_chain_changed(&self, chain_id: u64) {
        self.with_state(|g| {
            g.chain_id = chain_id;
            g.wallet_chains.insert(chain_id);
            g.events.push(ProviderEvent::ChainChanged(chain_id));
        });
    }

    /// Appends a log to every open filter.
    pub fn inject_log(&self, log: Value) {
        self.with_state(|g| {
            for queue in g.filters.values_mut() {
                queue.push(log.clone());
            }
        });
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state
            .lock()
            .map(|g| g.calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }

    pub fn active_chain(&self) -> u64 {
        self.state.lock().map(|g| g.chain_id).unwrap_or_default()
    }

    pub fn wallet_chains(&self) -> Vec<u64> {
        self.state
            .lock()
            .map(|g| g.wallet_chains.iter().copied().collect())
            .unwrap_or_default()
    }

    fn with_state(&self, apply: impl FnOnce(&mut ProviderState)) {
        if let Ok(mut g) = self.state.lock() {
            apply(&mut g);
        }
    }

    fn deterministic_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut g = self
            .state
            .lock()
            .map_err(|e| RpcError::message_only(format!("provider lock poisoned: {e}")))?;
        g.calls.push((method.to_owned(), params.clone()));

        if let Some(queue) = g.scripted_errors.get_mut(method) {
            if let Some(error) = queue.pop_front() {
                return Err(error);
            }
        }

        match method {
            "eth_accounts" | "eth_requestAccounts" => Ok(json!(g
                .accounts
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>())),
            "eth_chainId" => Ok(json!(hex_chain_id(g.chain_id))),
            "wallet_switchEthereumChain" => {
                let target = switch_target(&params)?;
                if !g.wallet_chains.contains(&target) {
                    return Err(RpcError::numeric(
                        4902,
                        format!(
                            "Unrecognized chain ID {:?}. Try adding the chain using wallet_addEthereumChain first.",
                            hex_chain_id(target)
                        ),
                    ));
                }
                if g.chain_id != target {
                    g.chain_id = target;
                    g.events.push(ProviderEvent::ChainChanged(target));
                }
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let target = switch_target(&params)?;
                g.wallet_chains.insert(target);
                Ok(Value::Null)
            }
            "wallet_revokePermissions" => {
                if !g.revocation_supported {
                    return Err(RpcError::numeric(
                        4200,
                        "the requested method is not supported by this provider",
                    ));
                }
                g.accounts.clear();
                g.events.push(ProviderEvent::AccountsChanged(Vec::new()));
                Ok(Value::Null)
            }
            "eth_call" => {
                let data = params
                    .get(0)
                    .and_then(|call| call.get("data"))
                    .and_then(Value::as_str)
                    .unwrap_or("0x");
                let result = g
                    .call_results
                    .iter()
                    .find(|(prefix, _)| data.starts_with(prefix.as_str()))
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| Value::String("0x".to_owned()));
                Ok(result)
            }
            "eth_sendTransaction" => {
                if g.accounts.is_empty() {
                    return Err(RpcError::numeric(4100, "no authorized account"));
                }
                g.tx_counter += 1;
                let mut seed = serde_json::to_vec(&params).unwrap_or_default();
                seed.extend_from_slice(&g.tx_counter.to_be_bytes());
                let hash = keccak256(seed);
                let receipt = json!({
                    "transactionHash": hash.to_string(),
                    "blockNumber": format!("0x{:x}", 0x10 + g.tx_counter),
                    "status": "0x1",
                    "from": params.get(0).and_then(|tx| tx.get("from")).cloned(),
                    "to": params.get(0).and_then(|tx| tx.get("to")).cloned(),
                });
                let delay = g.receipt_delay_polls;
                g.pending_receipts.insert(
                    hash,
                    PendingReceipt {
                        polls_remaining: delay,
                        receipt,
                    },
                );
                Ok(json!(hash.to_string()))
            }
            "eth_getTransactionReceipt" => {
                let hash: B256 = params
                    .get(0)
                    .and_then(Value::as_str)
                    .and_then(|raw| raw.parse().ok())
                    .ok_or_else(|| RpcError::numeric(-32602, "invalid transaction hash"))?;
                match g.pending_receipts.get_mut(&hash) {
                    Some(pending) if pending.polls_remaining > 0 => {
                        pending.polls_remaining -= 1;
                        Ok(Value::Null)
                    }
                    Some(pending) => Ok(pending.receipt.clone()),
                    None => Ok(Value::Null),
                }
            }
            "eth_newFilter" => {
                let id = format!("0x{:x}", g.next_filter_id);
                g.next_filter_id += 1;
                g.filters.insert(id.clone(), Vec::new());
                Ok(json!(id))
            }
            "eth_getFilterChanges" => {
                let id = params
                    .get(0)
                    .and_then(Value::as_str)
                    .ok_or_else(|| RpcError::numeric(-32602, "invalid filter id"))?;
                match g.filters.get_mut(id) {
                    Some(queue) => Ok(Value::Array(std::mem::take(queue))),
                    None => Err(RpcError::numeric(-32000, "filter not found")),
                }
            }
            "eth_uninstallFilter" => {
                let id = params
                    .get(0)
                    .and_then(Value::as_str)
                    .ok_or_else(|| RpcError::numeric(-32602, "invalid filter id"))?;
                Ok(json!(g.filters.remove(id).is_some()))
            }
            other => Err(RpcError::numeric(
                -32601,
                format!("the method {other} does not exist"),
            )),
        }
    }
}

impl ProviderPort for Eip1193Adapter {
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match &self.mode {
            ProviderMode::Disabled(reason) => Err(RpcError::unavailable(reason.clone())),
            ProviderMode::Deterministic => self.deterministic_request(method, params),
            ProviderMode::Proxy(proxy) => {
                post_json_rpc(&proxy.client, &proxy.base_url, method, &params)
            }
        }
    }

    fn drain_events(&self) -> Vec<ProviderEvent> {
        match self.state.lock() {
            Ok(mut g) => std::mem::take(&mut g.events),
            Err(e) => {
                warn!(error = %e, "provider state lock poisoned while draining events");
                Vec::new()
            }
        }
    }
}

fn switch_target(params: &Value) -> Result<u64, RpcError> {
    params
        .get(0)
        .and_then(|entry| entry.get("chainId"))
        .and_then(Value::as_str)
        .and_then(parse_chain_id)
        .ok_or_else(|| RpcError::numeric(-32602, "missing or invalid chainId parameter"))
}
