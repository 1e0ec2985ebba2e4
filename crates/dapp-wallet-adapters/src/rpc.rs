use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use dapp_wallet_core::{ProviderEvent, ProviderPort, RpcError, WalletError};

use crate::eip1193::Eip1193Adapter;

/// Sends one JSON-RPC 2.0 request and maps the response envelope into
/// either the `result` value or an [`RpcError`] carrying the endpoint's
/// code and message as-is.
pub fn post_json_rpc(
    client: &reqwest::blocking::Client,
    url: &str,
    method: &str,
    params: &Value,
) -> Result<Value, RpcError> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    debug!(%method, %url, "posting JSON-RPC request");

    let response = client
        .post(url)
        .json(&body)
        .send()
        .map_err(|e| RpcError::message_only(format!("transport failure calling {method}: {e}")))?;

    let envelope: Value = response
        .json()
        .map_err(|e| RpcError::message_only(format!("malformed JSON-RPC response: {e}")))?;

    if let Some(error) = envelope.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified JSON-RPC error")
            .to_owned();
        return Err(RpcError {
            code: error.get("code").cloned(),
            message,
        });
    }

    Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
}

/// Direct HTTP JSON-RPC transport to a node endpoint. Serves reads and
/// log filters when no wallet provider is injected; it never pushes
/// events, so [`ProviderPort::drain_events`] stays empty.
#[derive(Debug, Clone)]
pub struct HttpRpcAdapter {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpRpcAdapter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        let url = url.into();
        if url.is_empty() {
            return Err(WalletError::Configuration(
                "RPC endpoint URL must not be empty".to_owned(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                WalletError::Configuration(format!("failed to build RPC HTTP client: {e}"))
            })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ProviderPort for HttpRpcAdapter {
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        post_json_rpc(&self.client, &self.url, method, &params)
    }
}

/// Transport selected for event subscriptions: the wallet provider when
/// one is available, otherwise a plain RPC endpoint.
#[derive(Debug, Clone)]
pub enum EventTransport {
    Wallet(Eip1193Adapter),
    Rpc(HttpRpcAdapter),
}

impl ProviderPort for EventTransport {
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match self {
            Self::Wallet(wallet) => wallet.request(method, params),
            Self::Rpc(rpc) => rpc.request(method, params),
        }
    }

    fn drain_events(&self) -> Vec<ProviderEvent> {
        match self {
            Self::Wallet(wallet) => wallet.drain_events(),
            Self::Rpc(rpc) => rpc.drain_events(),
        }
    }
}

/// Picks the event transport: an available wallet provider wins, a
/// configured RPC URL is the fallback, and having neither is a
/// provider-unavailable error.
pub fn select_event_transport(
    wallet: Option<&Eip1193Adapter>,
    rpc_url: Option<&str>,
    timeout: Duration,
) -> Result<EventTransport, WalletError> {
    if let Some(wallet) = wallet {
        if wallet.available() {
            return Ok(EventTransport::Wallet(wallet.clone()));
        }
    }
    if let Some(url) = rpc_url {
        return Ok(EventTransport::Rpc(HttpRpcAdapter::new(url, timeout)?));
    }
    Err(WalletError::ProviderUnavailable(
        "no wallet provider and no fallback RPC endpoint configured".to_owned(),
    ))
}
